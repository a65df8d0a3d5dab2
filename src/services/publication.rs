use chrono::Utc;
use uuid::Uuid;

use crate::domain::newsletter::{Category, Newsletter};
use crate::domain::slug::{base36_millis, slugify};
use crate::error::ApiError;
use crate::repository::{
    AdminRepository, NewsletterFilter, NewsletterRepository, NewsletterStats, RepositoryError,
};

/// Owns the draft → published workflow and slug uniqueness.
pub struct PublicationManager<R> {
    repository: R,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNewsletter {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub published: bool,
}

/// Partial update. An omitted field leaves the stored value untouched; a
/// provided field overwrites it. For the nullable fields (excerpt, cover
/// image) an explicit JSON null clears the stored value, which is why they
/// are double options.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_image: Option<Option<String>>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub pinned: Option<bool>,
    pub published: Option<bool>,
}

// Keeps "field absent" distinct from "field: null": absent stays None via
// the default, while any present value (null included) deserializes into
// the inner option.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterPage {
    pub newsletters: Vec<Newsletter>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

impl<R: NewsletterRepository + AdminRepository> PublicationManager<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    #[tracing::instrument(
        name = "Creating a newsletter",
        skip(self, draft),
        fields(title = %draft.title)
    )]
    pub async fn create(
        &self,
        draft: NewNewsletter,
        author_id: Option<Uuid>,
    ) -> Result<Newsletter, ApiError> {
        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(ApiError::Validation(String::from(
                "title and content are required",
            )));
        }

        let slug = self.unique_slug(&draft.title, None).await?;
        let now = Utc::now();
        let newsletter = Newsletter {
            id: Uuid::new_v4(),
            title: draft.title,
            slug,
            content: draft.content,
            excerpt: draft.excerpt,
            cover_image: draft.cover_image,
            category: draft.category,
            tags: draft.tags,
            featured: draft.featured,
            pinned: draft.pinned,
            published: draft.published,
            published_at: draft.published.then_some(now),
            author_id,
            created_at: now,
            updated_at: now,
        };

        match self.repository.insert_newsletter(&newsletter).await {
            Ok(()) => Ok(newsletter),
            // Same title slugified in the same millisecond: the dedup
            // suffix is deterministic on purpose, so the unique index is
            // the one that breaks the tie.
            Err(RepositoryError::UniqueViolation(_)) => {
                Err(ApiError::Conflict(String::from("slug already in use")))
            }
            Err(other) => Err(other.into()),
        }
    }

    #[tracing::instrument(name = "Updating a newsletter", skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: NewsletterPatch) -> Result<Newsletter, ApiError> {
        let mut stored = self
            .repository
            .find_newsletter(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(String::from("newsletter not found")))?;

        if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
            return Err(ApiError::Validation(String::from("title cannot be empty")));
        }
        if matches!(&patch.content, Some(content) if content.trim().is_empty()) {
            return Err(ApiError::Validation(String::from("content cannot be empty")));
        }

        if let Some(title) = patch.title {
            if title != stored.title {
                stored.slug = self.unique_slug(&title, Some(id)).await?;
            }
            stored.title = title;
        }
        if let Some(content) = patch.content {
            stored.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            stored.excerpt = excerpt;
        }
        if let Some(cover_image) = patch.cover_image {
            stored.cover_image = cover_image;
        }
        if let Some(category) = patch.category {
            stored.category = category;
        }
        if let Some(tags) = patch.tags {
            stored.tags = tags;
        }
        if let Some(featured) = patch.featured {
            stored.featured = featured;
        }
        if let Some(pinned) = patch.pinned {
            stored.pinned = pinned;
        }
        if let Some(published) = patch.published {
            // The publish timestamp is stamped on the first false→true
            // transition of the stored value and never recomputed again:
            // unpublishing keeps it, republishing keeps the original.
            if published && !stored.published && stored.published_at.is_none() {
                stored.published_at = Some(Utc::now());
            }
            stored.published = published;
        }
        stored.updated_at = Utc::now();

        match self.repository.update_newsletter(&stored).await {
            Ok(()) => Ok(stored),
            Err(RepositoryError::UniqueViolation(_)) => {
                Err(ApiError::Conflict(String::from("slug already in use")))
            }
            Err(RepositoryError::NotFound) => {
                Err(ApiError::NotFound(String::from("newsletter not found")))
            }
            Err(other) => Err(other.into()),
        }
    }

    #[tracing::instrument(name = "Deleting a newsletter", skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.repository.delete_newsletter(id).await.map_err(|err| match err {
            RepositoryError::NotFound => ApiError::NotFound(String::from("newsletter not found")),
            other => other.into(),
        })
    }

    /// Single record plus the author's display name, when the weak author
    /// reference still resolves.
    pub async fn get(&self, id: Uuid) -> Result<(Newsletter, Option<String>), ApiError> {
        let newsletter = self
            .repository
            .find_newsletter(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(String::from("newsletter not found")))?;

        let author_name = match newsletter.author_id {
            Some(author_id) => self.repository.find_admin_name(author_id).await?,
            None => None,
        };

        Ok((newsletter, author_name))
    }

    pub async fn list(
        &self,
        filter: NewsletterFilter,
        page: u32,
        limit: u32,
    ) -> Result<NewsletterPage, ApiError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let (newsletters, total) = self
            .repository
            .list_newsletters(&filter, i64::from(limit), offset)
            .await?;

        Ok(NewsletterPage {
            newsletters,
            total,
            page,
            total_pages: (total + u64::from(limit) - 1) / u64::from(limit),
        })
    }

    pub async fn stats(&self) -> Result<NewsletterStats, ApiError> {
        Ok(self.repository.newsletter_stats().await?)
    }

    async fn unique_slug(&self, title: &str, exclude: Option<Uuid>) -> Result<String, ApiError> {
        let slug = slugify(title);
        // A title with no alphanumeric characters still needs a public
        // identity.
        if slug.is_empty() {
            return Ok(base36_millis(Utc::now()));
        }

        let collides = match self.repository.find_newsletter_by_slug(&slug).await? {
            Some(existing) => Some(existing.id) != exclude,
            None => false,
        };

        if collides {
            Ok(format!("{}-{}", slug, base36_millis(Utc::now())))
        } else {
            Ok(slug)
        }
    }
}
