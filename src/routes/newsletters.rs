use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::authentication::AdminContext;
use crate::domain::newsletter::{Category, Newsletter};
use crate::error::ApiError;
use crate::repository::{AdminRepository, NewsletterFilter, NewsletterRepository};
use crate::services::publication::{NewNewsletter, NewsletterPatch, PublicationManager};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub published: Option<bool>,
    pub category: Option<Category>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(serde::Serialize)]
struct AuthorView {
    name: String,
}

#[derive(serde::Serialize)]
struct NewsletterWithAuthor {
    #[serde(flatten)]
    newsletter: Newsletter,
    author: Option<AuthorView>,
}

#[tracing::instrument(name = "Listing newsletters", skip(query, admin, publications))]
pub async fn list_newsletters<R: NewsletterRepository + AdminRepository>(
    query: web::Query<ListQuery>,
    admin: Option<AdminContext>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    // Anonymous callers only ever see published posts; a privileged caller
    // chooses its own filter.
    let published = match admin {
        Some(_) => query.published,
        None => Some(true),
    };
    let filter = NewsletterFilter {
        published,
        category: query.category,
    };

    let page = publications
        .list(filter, query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(
    name = "Creating a newsletter",
    skip(admin, body, publications),
    fields(title = %body.title)
)]
pub async fn create_newsletter<R: NewsletterRepository + AdminRepository>(
    admin: AdminContext,
    body: web::Json<NewNewsletter>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let newsletter = publications
        .create(body.into_inner(), Some(admin.admin_id))
        .await?;

    Ok(HttpResponse::Created().json(newsletter))
}

#[tracing::instrument(name = "Fetching a newsletter", skip(publications))]
pub async fn get_newsletter<R: NewsletterRepository + AdminRepository>(
    id: web::Path<Uuid>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let (newsletter, author_name) = publications.get(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(NewsletterWithAuthor {
        newsletter,
        author: author_name.map(|name| AuthorView { name }),
    }))
}

#[tracing::instrument(name = "Updating a newsletter", skip(_admin, body, publications))]
pub async fn update_newsletter<R: NewsletterRepository + AdminRepository>(
    _admin: AdminContext,
    id: web::Path<Uuid>,
    body: web::Json<NewsletterPatch>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    let newsletter = publications.update(id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(name = "Deleting a newsletter", skip(_admin, publications))]
pub async fn delete_newsletter<R: NewsletterRepository + AdminRepository>(
    _admin: AdminContext,
    id: web::Path<Uuid>,
    publications: web::Data<PublicationManager<R>>,
) -> Result<HttpResponse, ApiError> {
    publications.delete(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Deleted" })))
}
