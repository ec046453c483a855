/**
 * Public Routes
 * Unauthenticated read endpoints for the published site, plus lead capture
 * and navigation config
 */
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    self,
    blogs::PublicBlogFilter,
    flatfile::FlatFileStore,
    models::{Blog, Page, SeoMeta},
};
use crate::error::ApiError;
use crate::routes::{is_valid_email, is_valid_slug, DataBody};

const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_PAGE_LIMIT: i64 = 100;
const DEFAULT_BLOG_LIMIT: i64 = 10;
const MAX_BLOG_LIMIT: i64 = 100;

// ============================================================================
// Response Types
// ============================================================================

/// Published page as served to the public site. Ownership and audit fields
/// stay internal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPageResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub seo: SeoMeta,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Page> for PublicPageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            content: page.content,
            excerpt: page.excerpt,
            featured_image: page.featured_image,
            seo: page.seo.0,
            published_at: page.published_at,
            updated_at: page.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBlogResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub seo: SeoMeta,
    pub views: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Blog> for PublicBlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            slug: blog.slug,
            content: blog.content,
            excerpt: blog.excerpt,
            featured_image: blog.featured_image,
            author: blog.author,
            categories: blog.categories,
            tags: blog.tags,
            seo: blog.seo.0,
            views: blog.views,
            published_at: blog.published_at,
            updated_at: blog.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct PublicBlogListResponse {
    pub data: Vec<PublicBlogResponse>,
    pub pagination: Pagination,
}

// ============================================================================
// Query/Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PublicPagesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicBlogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn flatfile_error(e: db::flatfile::FlatFileError) -> ApiError {
    tracing::error!("flat file store error: {}", e);
    ApiError::Internal("Storage unavailable".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/public/pages
pub async fn list_public_pages(
    Query(query): Query<PublicPagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let pool = db::pool()?;
    let pages = db::pages::list_published(pool.as_ref(), limit).await?;

    let data: Vec<PublicPageResponse> = pages.into_iter().map(Into::into).collect();
    Ok(Json(DataBody { data }))
}

/// GET /api/public/pages/:slug
pub async fn get_public_page(Path(slug): Path<String>) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_slug(&slug) {
        return Err(ApiError::Validation("Invalid slug format".to_string()));
    }

    let pool = db::pool()?;
    let page = db::pages::find_published_by_slug(pool.as_ref(), &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    Ok(Json(DataBody {
        data: PublicPageResponse::from(page),
    }))
}

/// GET /api/public/blogs
pub async fn list_public_blogs(
    Query(query): Query<PublicBlogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_BLOG_LIMIT)
        .clamp(1, MAX_BLOG_LIMIT);

    let filter = PublicBlogFilter {
        page,
        limit,
        search: query.search.filter(|s| !s.trim().is_empty()),
        category: query.category.filter(|s| !s.trim().is_empty()),
        tag: query.tag.filter(|s| !s.trim().is_empty()),
    };

    let pool = db::pool()?;
    let (blogs, total) = db::blogs::list_published(pool.as_ref(), &filter).await?;

    let data: Vec<PublicBlogResponse> = blogs.into_iter().map(Into::into).collect();
    let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    Ok(Json(PublicBlogListResponse {
        data,
        pagination: Pagination {
            total,
            page,
            limit,
            pages,
        },
    }))
}

/// GET /api/public/blogs/:slug
///
/// The view counter bump is best effort; a failed bump never fails the read.
pub async fn get_public_blog(Path(slug): Path<String>) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_slug(&slug) {
        return Err(ApiError::Validation("Invalid slug format".to_string()));
    }

    let pool = db::pool()?;
    let blog = db::blogs::find_published_by_slug(pool.as_ref(), &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;

    if let Err(e) = db::blogs::increment_views(pool.as_ref(), blog.id).await {
        tracing::warn!("failed to increment views for blog {}: {}", blog.id, e);
    }

    let mut response = PublicBlogResponse::from(blog);
    response.views += 1;

    Ok(Json(DataBody { data: response }))
}

/// POST /api/public/leads
pub async fn submit_lead(Json(payload): Json<LeadRequest>) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() || payload.email.is_empty() {
        return Err(ApiError::Validation(
            "Name and email are required".to_string(),
        ));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    let mut lead = json!({
        "id": Uuid::new_v4(),
        "name": payload.name,
        "email": payload.email,
        "status": "new",
        "source": "website",
        "createdAt": Utc::now().to_rfc3339(),
    });

    // Extra form fields ride along untouched, without overriding ours.
    if let Value::Object(map) = &mut lead {
        for (key, value) in payload.extra {
            map.entry(key).or_insert(value);
        }
    }

    let store = FlatFileStore::from_env();
    store.append("leads.json", lead).map_err(flatfile_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "Thank you for reaching out!"})),
    ))
}

/// GET /api/public/navigation
pub async fn get_navigation() -> Result<impl IntoResponse, ApiError> {
    let store = FlatFileStore::from_env();
    let items = store.read_array("navigation.json").map_err(flatfile_error)?;

    Ok(Json(DataBody { data: items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn public_router() -> Router {
        Router::new()
            .route("/api/public/pages/{slug}", get(get_public_page))
            .route("/api/public/blogs/{slug}", get(get_public_blog))
            .route("/api/public/leads", post(submit_lead))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> StatusCode {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_page_bad_slug_returns_bad_request() {
        let req = Request::get("/api/public/pages/Not%20A%20Slug")
            .body(Body::empty())
            .unwrap();
        let res = public_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blog_bad_slug_returns_bad_request() {
        let req = Request::get("/api/public/blogs/UPPER")
            .body(Body::empty())
            .unwrap();
        let res = public_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lead_missing_name_returns_bad_request() {
        let status = post_json(
            public_router(),
            "/api/public/leads",
            json!({"name": "", "email": "a@x.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lead_invalid_email_returns_bad_request() {
        let status = post_json(
            public_router(),
            "/api/public/leads",
            json!({"name": "A", "email": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_blog_list_page_count_rounds_up() {
        // 21 rows at limit 10 spans 3 pages
        let total = 21i64;
        let limit = 10i64;
        assert_eq!((total + limit - 1) / limit, 3);
    }
}
