use chrono::Utc;
use uuid::Uuid;

use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::token::generate_token;
use crate::error::ApiError;
use crate::repository::{RepositoryError, SubscriberRepository, SubscriberStats};

/// Owns the subscriber lifecycle:
/// new → active+unconfirmed → active+confirmed → inactive → active+unconfirmed → …
///
/// Every operation reads the current record fresh and writes the full next
/// state back; the unique index on email is the final arbiter when two
/// requests race.
pub struct SubscriptionManager<R> {
    repository: R,
}

#[derive(Debug)]
pub enum SubscribeOutcome {
    Created(Subscriber),
    Reactivated(Subscriber),
}

impl<R: SubscriberRepository> SubscriptionManager<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    #[tracing::instrument(name = "Subscribing an email address", skip(self, email, name))]
    pub async fn subscribe(
        &self,
        email: String,
        name: Option<String>,
    ) -> Result<SubscribeOutcome, ApiError> {
        let email = SubscriberEmail::parse(email).map_err(ApiError::Validation)?;
        let name = name
            .map(SubscriberName::parse)
            .transpose()
            .map_err(ApiError::Validation)?;

        match self.repository.find_subscriber_by_email(email.as_ref()).await? {
            Some(existing) if existing.active && existing.confirmed => {
                Err(ApiError::Conflict(String::from("already subscribed")))
            }
            Some(mut existing) => {
                // Reactivation: same row, fresh confirmation cycle. The
                // record keeps its identity and history across
                // unsubscribe/resubscribe cycles.
                existing.active = true;
                existing.confirmed = false;
                existing.confirm_token = generate_token();
                existing.unsubscribed_at = None;
                if existing.name.is_none() {
                    existing.name = name;
                }
                self.repository.update_subscriber(&existing).await?;

                tracing::info!("An inactive subscriber has been reactivated.");
                Ok(SubscribeOutcome::Reactivated(existing))
            }
            None => {
                let now = Utc::now();
                let subscriber = Subscriber {
                    id: Uuid::new_v4(),
                    email,
                    name,
                    active: true,
                    // Auto-confirmed at creation until a real email
                    // verification flow exists; the confirm token is
                    // generated but nothing consumes it yet.
                    confirmed: true,
                    confirm_token: generate_token(),
                    unsub_token: generate_token(),
                    confirmed_at: Some(now),
                    unsubscribed_at: None,
                    created_at: now,
                };

                match self.repository.insert_subscriber(&subscriber).await {
                    Ok(()) => {
                        tracing::info!("New subscriber has been saved successfully.");
                        Ok(SubscribeOutcome::Created(subscriber))
                    }
                    // Lost the race against a concurrent subscribe for the
                    // same email; the unique index wins.
                    Err(RepositoryError::UniqueViolation(_)) => {
                        Err(ApiError::Conflict(String::from("already subscribed")))
                    }
                    Err(other) => Err(other.into()),
                }
            }
        }
    }

    #[tracing::instrument(name = "Unsubscribing an email address", skip(self, email))]
    pub async fn unsubscribe(&self, email: String) -> Result<(), ApiError> {
        let email = SubscriberEmail::parse(email).map_err(ApiError::Validation)?;

        let mut subscriber = self
            .repository
            .find_subscriber_by_email(email.as_ref())
            .await?
            .ok_or_else(|| ApiError::NotFound(String::from("email not found")))?;

        // Unsubscribing someone who already left is a success, not an
        // error, and performs no write.
        if !subscriber.active {
            return Ok(());
        }

        subscriber.active = false;
        subscriber.unsubscribed_at = Some(Utc::now());
        self.repository.update_subscriber(&subscriber).await?;

        Ok(())
    }

    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>, ApiError> {
        Ok(self.repository.list_subscribers().await?)
    }

    #[tracing::instrument(name = "Deleting a subscriber", skip(self))]
    pub async fn delete_subscriber(&self, id: Uuid) -> Result<(), ApiError> {
        self.repository.delete_subscriber(id).await.map_err(|err| match err {
            RepositoryError::NotFound => ApiError::NotFound(String::from("subscriber not found")),
            other => other.into(),
        })
    }

    pub async fn stats(&self) -> Result<SubscriberStats, ApiError> {
        Ok(self.repository.subscriber_stats().await?)
    }
}
