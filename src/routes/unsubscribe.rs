use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::repository::SubscriberRepository;
use crate::services::subscription::SubscriptionManager;

#[derive(serde::Deserialize)]
pub struct UnsubscribeBody {
    pub email: String,
}

#[tracing::instrument(
    name = "Unsubscribing a subscriber",
    skip(body, subscriptions),
    fields(subscriber_email = %body.email)
)]
pub async fn unsubscribe<R: SubscriberRepository>(
    body: web::Json<UnsubscribeBody>,
    subscriptions: web::Data<SubscriptionManager<R>>,
) -> Result<HttpResponse, ApiError> {
    subscriptions.unsubscribe(body.into_inner().email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Unsubscribed" })))
}
