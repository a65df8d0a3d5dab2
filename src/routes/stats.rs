use actix_web::{web, HttpResponse};

use crate::authentication::AdminContext;
use crate::error::ApiError;
use crate::repository::{AdminRepository, NewsletterRepository, SubscriberRepository};
use crate::services::publication::PublicationManager;
use crate::services::subscription::SubscriptionManager;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_newsletters: u64,
    published: u64,
    drafts: u64,
    total_subscribers: u64,
    active_subscribers: u64,
}

#[tracing::instrument(name = "Fetching admin stats", skip(_admin, subscriptions, publications))]
pub async fn admin_stats<R: SubscriberRepository + NewsletterRepository + AdminRepository>(
    _admin: AdminContext,
    subscriptions: web::Data<SubscriptionManager<R>>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let newsletters = publications.stats().await?;
    let subscribers = subscriptions.stats().await?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_newsletters: newsletters.total,
        published: newsletters.published,
        drafts: newsletters.total - newsletters.published,
        total_subscribers: subscribers.total,
        active_subscribers: subscribers.active,
    }))
}
