use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A post. `slug` is the public identity and stays unique across all
/// records, drafts included. `published_at` is stamped on first publish and
/// never moves afterwards.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category: Category,
    pub tags: Vec<String>,
    pub featured: bool,
    pub pinned: bool,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Update,
    Announcement,
    Promotion,
    Bulletin,
}

impl Category {
    pub fn parse(category: &str) -> Result<Category, String> {
        match category {
            "update" => Ok(Category::Update),
            "announcement" => Ok(Category::Announcement),
            "promotion" => Ok(Category::Promotion),
            "bulletin" => Ok(Category::Bulletin),
            _ => Err(format!("{} is not a valid newsletter category", category)),
        }
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        match self {
            Category::Update => "update",
            Category::Announcement => "announcement",
            Category::Promotion => "promotion",
            Category::Bulletin => "bulletin",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Update
    }
}
