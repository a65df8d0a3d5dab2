use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::authentication::AdminContext;
use crate::domain::subscriber::Subscriber;
use crate::email_client::EmailClient;
use crate::error::ApiError;
use crate::repository::SubscriberRepository;
use crate::services::subscription::{SubscribeOutcome, SubscriptionManager};
use crate::startup::ApplicationBaseUrl;

#[derive(serde::Deserialize)]
pub struct SubscribeBody {
    pub email: String,
    pub name: Option<String>,
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, subscriptions, email_client, base_url),
    fields(subscriber_email = %body.email)
)]
pub async fn create_subscriber<R: SubscriberRepository>(
    body: web::Json<SubscribeBody>,
    subscriptions: web::Data<SubscriptionManager<R>>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, ApiError> {
    let SubscribeBody { email, name } = body.into_inner();
    let outcome = subscriptions.subscribe(email, name).await?;

    let (message, subscriber) = match &outcome {
        SubscribeOutcome::Created(subscriber) => ("Subscribed successfully!", subscriber),
        SubscribeOutcome::Reactivated(subscriber) => {
            ("Re-subscribed! Check your inbox to confirm.", subscriber)
        }
    };

    if let Err(err) = send_welcome_email(&email_client, subscriber, &base_url.0).await {
        // Outbound mail must never fail a subscription.
        tracing::warn!(error = ?err, "Failed to send the welcome email");
    }

    let body = serde_json::json!({ "message": message });
    Ok(match outcome {
        SubscribeOutcome::Created(_) => HttpResponse::Created().json(body),
        SubscribeOutcome::Reactivated(_) => HttpResponse::Ok().json(body),
    })
}

#[tracing::instrument(
    name = "Send a welcome email to a subscriber",
    skip(email_client, subscriber, base_url)
)]
async fn send_welcome_email(
    email_client: &EmailClient,
    subscriber: &Subscriber,
    base_url: &str,
) -> Result<(), reqwest::Error> {
    let unsubscribe_link = format!("{}/unsubscribe?token={}", base_url, subscriber.unsub_token);
    let html_body = format!(
        r#"
            <div>
                <h1>Welcome to our newsletter!</h1>
                <p>You will receive new posts as they are published.</p>
                <p><a href="{}">Unsubscribe</a></p>
            </div>
        "#,
        unsubscribe_link
    );

    email_client
        .send_email(&subscriber.email, "Welcome to our newsletter", &html_body)
        .await
}

#[tracing::instrument(name = "Listing subscribers", skip(_admin, subscriptions))]
pub async fn list_subscribers<R: SubscriberRepository>(
    _admin: AdminContext,
    subscriptions: web::Data<SubscriptionManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let subscribers = subscriptions.list_subscribers().await?;

    Ok(HttpResponse::Ok().json(subscribers))
}

#[tracing::instrument(name = "Deleting a subscriber", skip(_admin, subscriptions))]
pub async fn delete_subscriber<R: SubscriberRepository>(
    _admin: AdminContext,
    id: web::Path<Uuid>,
    subscriptions: web::Data<SubscriptionManager<R>>,
) -> Result<HttpResponse, ApiError> {
    subscriptions.delete_subscriber(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Deleted" })))
}
