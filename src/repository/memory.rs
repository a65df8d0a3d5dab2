use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::newsletter::Newsletter;
use crate::domain::subscriber::Subscriber;
use crate::repository::{
    AdminRepository, NewsletterFilter, NewsletterRepository, NewsletterStats, RepositoryError,
    SubscriberRepository, SubscriberStats,
};

struct AdminRecord {
    id: Uuid,
    username: String,
    name: String,
}

#[derive(Default)]
struct Inner {
    subscribers: Vec<Subscriber>,
    newsletters: Vec<Newsletter>,
    admins: Vec<AdminRecord>,
}

/// Map-backed storage engine behind a single lock. Enforces the same
/// unique constraints as the Postgres schema (subscriber email, newsletter
/// slug, admin username), so the managers observe identical conflict
/// behavior. Backs the API test suite and tokenless local runs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock means a writer panicked mid-operation; nothing
        // sane can be read from the store after that.
        self.inner.lock().expect("in-memory repository lock poisoned")
    }
}

fn ordering_contract(a: &Newsletter, b: &Newsletter) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| match (a.published_at, b.published_at) {
            (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

impl SubscriberRepository for InMemoryRepository {
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        if inner
            .subscribers
            .iter()
            .any(|existing| existing.email == subscriber.email)
        {
            return Err(RepositoryError::UniqueViolation(String::from(
                "subscribers.email",
            )));
        }

        inner.subscribers.push(subscriber.clone());
        Ok(())
    }

    async fn update_subscriber(&self, subscriber: &Subscriber) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        let stored = inner
            .subscribers
            .iter_mut()
            .find(|existing| existing.id == subscriber.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = subscriber.clone();

        Ok(())
    }

    async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let inner = self.lock();

        Ok(inner
            .subscribers
            .iter()
            .find(|subscriber| subscriber.email.as_ref() == email)
            .cloned())
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, RepositoryError> {
        let inner = self.lock();

        let mut subscribers = inner.subscribers.clone();
        // Stable sort keeps insertion order for creation-time ties.
        subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(subscribers)
    }

    async fn delete_subscriber(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        let position = inner
            .subscribers
            .iter()
            .position(|subscriber| subscriber.id == id)
            .ok_or(RepositoryError::NotFound)?;
        inner.subscribers.remove(position);

        Ok(())
    }

    async fn subscriber_stats(&self) -> Result<SubscriberStats, RepositoryError> {
        let inner = self.lock();

        Ok(SubscriberStats {
            total: inner.subscribers.len() as u64,
            active: inner
                .subscribers
                .iter()
                .filter(|subscriber| subscriber.active)
                .count() as u64,
        })
    }
}

impl NewsletterRepository for InMemoryRepository {
    async fn insert_newsletter(&self, newsletter: &Newsletter) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        if inner
            .newsletters
            .iter()
            .any(|existing| existing.slug == newsletter.slug)
        {
            return Err(RepositoryError::UniqueViolation(String::from(
                "newsletters.slug",
            )));
        }

        inner.newsletters.push(newsletter.clone());
        Ok(())
    }

    async fn update_newsletter(&self, newsletter: &Newsletter) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        if inner
            .newsletters
            .iter()
            .any(|existing| existing.id != newsletter.id && existing.slug == newsletter.slug)
        {
            return Err(RepositoryError::UniqueViolation(String::from(
                "newsletters.slug",
            )));
        }

        let stored = inner
            .newsletters
            .iter_mut()
            .find(|existing| existing.id == newsletter.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = newsletter.clone();

        Ok(())
    }

    async fn find_newsletter(&self, id: Uuid) -> Result<Option<Newsletter>, RepositoryError> {
        let inner = self.lock();

        Ok(inner
            .newsletters
            .iter()
            .find(|newsletter| newsletter.id == id)
            .cloned())
    }

    async fn find_newsletter_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Newsletter>, RepositoryError> {
        let inner = self.lock();

        Ok(inner
            .newsletters
            .iter()
            .find(|newsletter| newsletter.slug == slug)
            .cloned())
    }

    async fn delete_newsletter(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        let position = inner
            .newsletters
            .iter()
            .position(|newsletter| newsletter.id == id)
            .ok_or(RepositoryError::NotFound)?;
        inner.newsletters.remove(position);

        Ok(())
    }

    async fn list_newsletters(
        &self,
        filter: &NewsletterFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Newsletter>, u64), RepositoryError> {
        let inner = self.lock();

        let mut matches: Vec<Newsletter> = inner
            .newsletters
            .iter()
            .filter(|newsletter| {
                filter
                    .published
                    .map(|published| newsletter.published == published)
                    .unwrap_or(true)
                    && filter
                        .category
                        .map(|category| newsletter.category == category)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matches.sort_by(ordering_contract);

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((items, total))
    }

    async fn newsletter_stats(&self) -> Result<NewsletterStats, RepositoryError> {
        let inner = self.lock();

        Ok(NewsletterStats {
            total: inner.newsletters.len() as u64,
            published: inner
                .newsletters
                .iter()
                .filter(|newsletter| newsletter.published)
                .count() as u64,
        })
    }
}

impl AdminRepository for InMemoryRepository {
    async fn upsert_admin(&self, username: &str, name: &str) -> Result<Uuid, RepositoryError> {
        let mut inner = self.lock();

        if let Some(admin) = inner
            .admins
            .iter_mut()
            .find(|admin| admin.username == username)
        {
            admin.name = name.to_string();
            return Ok(admin.id);
        }

        let id = Uuid::new_v4();
        inner.admins.push(AdminRecord {
            id,
            username: username.to_string(),
            name: name.to_string(),
        });

        Ok(id)
    }

    async fn find_admin_name(&self, id: Uuid) -> Result<Option<String>, RepositoryError> {
        let inner = self.lock();

        Ok(inner
            .admins
            .iter()
            .find(|admin| admin.id == id)
            .map(|admin| admin.name.clone()))
    }
}
