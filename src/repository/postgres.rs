use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::newsletter::{Category, Newsletter};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::repository::{
    AdminRepository, NewsletterFilter, NewsletterRepository, NewsletterStats, RepositoryError,
    SubscriberRepository, SubscriberStats,
};

const SUBSCRIBER_COLUMNS: &str = "id, email, name, active, confirmed, confirm_token, \
     unsub_token, confirmed_at, unsubscribed_at, created_at";

const NEWSLETTER_COLUMNS: &str = "id, title, slug, content, excerpt, cover_image, category, \
     tags, featured, pinned, published, published_at, author_id, created_at, updated_at";

/// Production storage engine. Uniqueness of subscriber emails and
/// newsletter slugs is enforced by unique indexes; a 23505 rejection is
/// surfaced as `UniqueViolation` for the managers to translate.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_repository_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return RepositoryError::UniqueViolation(db_err.message().to_string());
        }
    }

    RepositoryError::Storage(err)
}

fn subscriber_from_row(row: PgRow) -> Result<Subscriber, RepositoryError> {
    let email: String = row.try_get("email")?;
    let name: Option<String> = row.try_get("name")?;

    Ok(Subscriber {
        id: row.try_get("id")?,
        email: SubscriberEmail::parse(email).map_err(RepositoryError::Decode)?,
        name: name
            .map(SubscriberName::parse)
            .transpose()
            .map_err(RepositoryError::Decode)?,
        active: row.try_get("active")?,
        confirmed: row.try_get("confirmed")?,
        confirm_token: row.try_get("confirm_token")?,
        unsub_token: row.try_get("unsub_token")?,
        confirmed_at: row.try_get("confirmed_at")?,
        unsubscribed_at: row.try_get("unsubscribed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn newsletter_from_row(row: PgRow) -> Result<Newsletter, RepositoryError> {
    let category: String = row.try_get("category")?;
    let tags: Option<String> = row.try_get("tags")?;

    Ok(Newsletter {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        cover_image: row.try_get("cover_image")?,
        category: Category::parse(&category).map_err(RepositoryError::Decode)?,
        tags: tags
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|err| RepositoryError::Decode(err.to_string()))?
            .unwrap_or_default(),
        featured: row.try_get("featured")?,
        pinned: row.try_get("pinned")?,
        published: row.try_get("published")?,
        published_at: row.try_get("published_at")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn serialize_tags(tags: &[String]) -> Result<Option<String>, RepositoryError> {
    if tags.is_empty() {
        return Ok(None);
    }

    serde_json::to_string(tags)
        .map(Some)
        .map_err(|err| RepositoryError::Decode(err.to_string()))
}

impl SubscriberRepository for PgRepository {
    #[tracing::instrument(
        name = "Saving new subscriber details in the database",
        skip(self, subscriber)
    )]
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO subscribers
            (id, email, name, active, confirmed, confirm_token, unsub_token,
             confirmed_at, unsubscribed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(subscriber.id)
        .bind(subscriber.email.as_ref())
        .bind(subscriber.name.as_ref().map(|name| name.as_ref()))
        .bind(subscriber.active)
        .bind(subscriber.confirmed)
        .bind(&subscriber.confirm_token)
        .bind(&subscriber.unsub_token)
        .bind(subscriber.confirmed_at)
        .bind(subscriber.unsubscribed_at)
        .bind(subscriber.created_at)
        .execute(&self.pool)
        .await
        .map_err(into_repository_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Updating subscriber details in the database", skip(self, subscriber))]
    async fn update_subscriber(&self, subscriber: &Subscriber) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE subscribers
            SET name = $2, active = $3, confirmed = $4, confirm_token = $5,
                unsub_token = $6, confirmed_at = $7, unsubscribed_at = $8
            WHERE id = $1
            "#,
        )
        .bind(subscriber.id)
        .bind(subscriber.name.as_ref().map(|name| name.as_ref()))
        .bind(subscriber.active)
        .bind(subscriber.confirmed)
        .bind(&subscriber.confirm_token)
        .bind(&subscriber.unsub_token)
        .bind(subscriber.confirmed_at)
        .bind(subscriber.unsubscribed_at)
        .execute(&self.pool)
        .await
        .map_err(into_repository_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(name = "Fetching a subscriber by email", skip(self))]
    async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let query = format!("SELECT {} FROM subscribers WHERE email = $1", SUBSCRIBER_COLUMNS);

        sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(subscriber_from_row)
            .transpose()
    }

    #[tracing::instrument(name = "Listing subscribers", skip(self))]
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM subscribers ORDER BY created_at DESC, id",
            SUBSCRIBER_COLUMNS
        );

        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(subscriber_from_row)
            .collect()
    }

    #[tracing::instrument(name = "Deleting a subscriber", skip(self))]
    async fn delete_subscriber(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(name = "Counting subscribers", skip(self))]
    async fn subscriber_stats(&self) -> Result<SubscriberStats, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE active) AS active
            FROM subscribers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SubscriberStats {
            total: row.try_get::<i64, _>("total")? as u64,
            active: row.try_get::<i64, _>("active")? as u64,
        })
    }
}

impl NewsletterRepository for PgRepository {
    #[tracing::instrument(name = "Saving a new newsletter in the database", skip(self, newsletter))]
    async fn insert_newsletter(&self, newsletter: &Newsletter) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO newsletters
            (id, title, slug, content, excerpt, cover_image, category, tags,
             featured, pinned, published, published_at, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(newsletter.id)
        .bind(&newsletter.title)
        .bind(&newsletter.slug)
        .bind(&newsletter.content)
        .bind(&newsletter.excerpt)
        .bind(&newsletter.cover_image)
        .bind(newsletter.category.as_ref())
        .bind(serialize_tags(&newsletter.tags)?)
        .bind(newsletter.featured)
        .bind(newsletter.pinned)
        .bind(newsletter.published)
        .bind(newsletter.published_at)
        .bind(newsletter.author_id)
        .bind(newsletter.created_at)
        .bind(newsletter.updated_at)
        .execute(&self.pool)
        .await
        .map_err(into_repository_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Updating a newsletter in the database", skip(self, newsletter))]
    async fn update_newsletter(&self, newsletter: &Newsletter) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE newsletters
            SET title = $2, slug = $3, content = $4, excerpt = $5, cover_image = $6,
                category = $7, tags = $8, featured = $9, pinned = $10, published = $11,
                published_at = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(newsletter.id)
        .bind(&newsletter.title)
        .bind(&newsletter.slug)
        .bind(&newsletter.content)
        .bind(&newsletter.excerpt)
        .bind(&newsletter.cover_image)
        .bind(newsletter.category.as_ref())
        .bind(serialize_tags(&newsletter.tags)?)
        .bind(newsletter.featured)
        .bind(newsletter.pinned)
        .bind(newsletter.published)
        .bind(newsletter.published_at)
        .bind(newsletter.updated_at)
        .execute(&self.pool)
        .await
        .map_err(into_repository_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(name = "Fetching a newsletter by id", skip(self))]
    async fn find_newsletter(&self, id: Uuid) -> Result<Option<Newsletter>, RepositoryError> {
        let query = format!("SELECT {} FROM newsletters WHERE id = $1", NEWSLETTER_COLUMNS);

        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(newsletter_from_row)
            .transpose()
    }

    #[tracing::instrument(name = "Fetching a newsletter by slug", skip(self))]
    async fn find_newsletter_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Newsletter>, RepositoryError> {
        let query = format!("SELECT {} FROM newsletters WHERE slug = $1", NEWSLETTER_COLUMNS);

        sqlx::query(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(newsletter_from_row)
            .transpose()
    }

    #[tracing::instrument(name = "Deleting a newsletter", skip(self))]
    async fn delete_newsletter(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM newsletters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(name = "Listing newsletters", skip(self, filter))]
    async fn list_newsletters(
        &self,
        filter: &NewsletterFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Newsletter>, u64), RepositoryError> {
        let mut conditions = Vec::new();
        if filter.published.is_some() {
            conditions.push(format!("published = ${}", conditions.len() + 1));
        }
        if filter.category.is_some() {
            conditions.push(format!("category = ${}", conditions.len() + 1));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) AS total FROM newsletters{}", where_clause);
        let mut count = sqlx::query(&count_query);
        if let Some(published) = filter.published {
            count = count.bind(published);
        }
        if let Some(category) = &filter.category {
            count = count.bind(category.as_ref());
        }
        let total = count
            .fetch_one(&self.pool)
            .await?
            .try_get::<i64, _>("total")? as u64;

        let page_query = format!(
            "SELECT {} FROM newsletters{} \
             ORDER BY pinned DESC, published_at DESC NULLS LAST, created_at DESC \
             LIMIT ${} OFFSET ${}",
            NEWSLETTER_COLUMNS,
            where_clause,
            conditions.len() + 1,
            conditions.len() + 2,
        );
        let mut page = sqlx::query(&page_query);
        if let Some(published) = filter.published {
            page = page.bind(published);
        }
        if let Some(category) = &filter.category {
            page = page.bind(category.as_ref());
        }
        let items = page
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(newsletter_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    #[tracing::instrument(name = "Counting newsletters", skip(self))]
    async fn newsletter_stats(&self) -> Result<NewsletterStats, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE published) AS published
            FROM newsletters
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(NewsletterStats {
            total: row.try_get::<i64, _>("total")? as u64,
            published: row.try_get::<i64, _>("published")? as u64,
        })
    }
}

impl AdminRepository for PgRepository {
    #[tracing::instrument(name = "Upserting the configured admin", skip(self))]
    async fn upsert_admin(&self, username: &str, name: &str) -> Result<Uuid, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO admins (id, username, name, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    #[tracing::instrument(name = "Resolving an author name", skip(self))]
    async fn find_admin_name(&self, id: Uuid) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT name FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get("name"))
            .transpose()
            .map_err(RepositoryError::Storage)
    }
}
