use std::future::Future;

use uuid::Uuid;

use crate::domain::newsletter::{Category, Newsletter};
use crate::domain::subscriber::Subscriber;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

/// Storage-layer failures. `UniqueViolation` is the load-bearing variant:
/// the managers' read-check-write sequences are only preconditions, and the
/// unique indexes on email and slug are what actually guarantees the
/// no-duplicate invariants under concurrency.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("stored record failed validation: {0}")]
    Decode(String),
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default)]
pub struct NewsletterFilter {
    pub published: Option<bool>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Copy)]
pub struct SubscriberStats {
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewsletterStats {
    pub total: u64,
    pub published: u64,
}

pub trait SubscriberRepository: Clone + Send + Sync + 'static {
    fn insert_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Writes the whole record back; the caller decided the transition.
    fn update_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Lookup by normalized email, the subscriber's identity key.
    fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Subscriber>, RepositoryError>> + Send;

    /// All subscribers, newest first, stable for creation-time ties.
    fn list_subscribers(
        &self,
    ) -> impl Future<Output = Result<Vec<Subscriber>, RepositoryError>> + Send;

    fn delete_subscriber(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn subscriber_stats(
        &self,
    ) -> impl Future<Output = Result<SubscriberStats, RepositoryError>> + Send;
}

pub trait NewsletterRepository: Clone + Send + Sync + 'static {
    fn insert_newsletter(
        &self,
        newsletter: &Newsletter,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn update_newsletter(
        &self,
        newsletter: &Newsletter,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_newsletter(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Newsletter>, RepositoryError>> + Send;

    fn find_newsletter_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Newsletter>, RepositoryError>> + Send;

    fn delete_newsletter(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// One page of records plus the total match count. Ordering contract:
    /// pinned desc, then published_at desc with nulls after every real
    /// date, then created_at desc.
    fn list_newsletters(
        &self,
        filter: &NewsletterFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<(Vec<Newsletter>, u64), RepositoryError>> + Send;

    fn newsletter_stats(
        &self,
    ) -> impl Future<Output = Result<NewsletterStats, RepositoryError>> + Send;
}

pub trait AdminRepository: Clone + Send + Sync + 'static {
    /// Inserts or refreshes the configured administrator, returning its id.
    fn upsert_admin(
        &self,
        username: &str,
        name: &str,
    ) -> impl Future<Output = Result<Uuid, RepositoryError>> + Send;

    fn find_admin_name(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;
}
