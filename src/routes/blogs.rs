/**
 * Blog Routes
 * Authenticated CRUD for blog posts, with ownership enforcement
 */
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::db::{
    self, activity,
    blogs::{BlogPatch, NewBlog},
    models::{Blog, ContentStatus, EntityType, Role, SeoMeta},
};
use crate::error::ApiError;
use crate::permissions::can_manage_content;
use crate::routes::{is_valid_slug, DataBody, SuccessBody};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub seo: SeoMeta,
    pub views: i64,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        let status = blog.status();
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
            status,
            seo: blog.seo.0,
            views: blog.views,
            created_by: blog.created_by,
            updated_by: blog.updated_by,
            published_at: blog.published_at,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

fn validate_new_blog(new: &NewBlog) -> Result<(), ApiError> {
    if new.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if new.slug.trim().is_empty() {
        return Err(ApiError::Validation("Slug is required".to_string()));
    }
    if !is_valid_slug(&new.slug) {
        return Err(ApiError::Validation(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    if new.content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required".to_string()));
    }
    if new.author.trim().is_empty() {
        return Err(ApiError::Validation("Author is required".to_string()));
    }
    if new.seo.title.trim().is_empty() || new.seo.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "SEO title and description are required".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/blogs - all posts for super admins, own posts for content admins
pub async fn list_blogs(session: AuthSession) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let blogs = match session.role {
        Role::SuperAdmin => db::blogs::list_all(pool.as_ref()).await?,
        Role::ContentAdmin => db::blogs::list_by_owner(pool.as_ref(), session.user_id).await?,
    };

    let data: Vec<BlogResponse> = blogs.into_iter().map(Into::into).collect();
    Ok(Json(DataBody { data }))
}

/// GET /api/blogs/:id
pub async fn get_blog(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let blog = db::blogs::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;

    if !can_manage_content(session.role, blog.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    Ok(Json(DataBody {
        data: BlogResponse::from(blog),
    }))
}

/// POST /api/blogs
pub async fn create_blog(
    session: AuthSession,
    Json(payload): Json<NewBlog>,
) -> Result<impl IntoResponse, ApiError> {
    validate_new_blog(&payload)?;

    let pool = db::pool()?;

    if db::blogs::slug_exists(pool.as_ref(), &payload.slug).await? {
        return Err(ApiError::Conflict(
            "A blog post with this slug already exists".to_string(),
        ));
    }

    let blog = db::blogs::insert(pool.as_ref(), &payload, session.user_id)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A blog post with this slug already exists".to_string())
            } else {
                e.into()
            }
        })?;

    activity::record(
        session.user_id,
        "Created blog post",
        EntityType::Blog,
        Some(blog.id.to_string()),
        format!("Created blog post: {}", blog.title),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataBody {
            data: BlogResponse::from(blog),
        }),
    ))
}

/// PATCH /api/blogs/:id
pub async fn update_blog(
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<BlogPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let existing = db::blogs::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;

    if !can_manage_content(session.role, existing.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    if let Some(slug) = &patch.slug {
        if !is_valid_slug(slug) {
            return Err(ApiError::Validation(
                "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
            ));
        }
        if slug != &existing.slug && db::blogs::slug_exists(pool.as_ref(), slug).await? {
            return Err(ApiError::Conflict(
                "A blog post with this slug already exists".to_string(),
            ));
        }
    }

    let blog = db::blogs::update(pool.as_ref(), &existing, patch, session.user_id)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A blog post with this slug already exists".to_string())
            } else {
                e.into()
            }
        })?;

    activity::record(
        session.user_id,
        "Updated blog post",
        EntityType::Blog,
        Some(blog.id.to_string()),
        format!("Updated blog post: {}", blog.title),
    )
    .await;

    Ok(Json(DataBody {
        data: BlogResponse::from(blog),
    }))
}

/// DELETE /api/blogs/:id
pub async fn delete_blog(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let blog = db::blogs::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;

    if !can_manage_content(session.role, blog.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    db::blogs::delete(pool.as_ref(), id).await?;

    activity::record(
        session.user_id,
        "Deleted blog post",
        EntityType::Blog,
        Some(id.to_string()),
        format!("Deleted blog post: {}", blog.title),
    )
    .await;

    Ok(Json(SuccessBody { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn blogs_router() -> Router {
        Router::new()
            .route("/api/blogs", get(list_blogs).post(create_blog))
            .route(
                "/api/blogs/{id}",
                get(get_blog).patch(update_blog).delete(delete_blog),
            )
    }

    #[tokio::test]
    async fn test_list_without_session_returns_unauthorized() {
        let req = Request::get("/api/blogs").body(Body::empty()).unwrap();
        let res = blogs_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_without_session_returns_unauthorized() {
        let req = Request::patch(format!("/api/blogs/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let res = blogs_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validate_new_blog_requires_author() {
        let new = NewBlog {
            title: "T".to_string(),
            slug: "t".to_string(),
            content: "c".to_string(),
            excerpt: None,
            featured_image: None,
            author: "".to_string(),
            categories: vec![],
            tags: vec![],
            status: ContentStatus::Draft,
            seo: SeoMeta {
                title: "t".to_string(),
                description: "d".to_string(),
                ..SeoMeta::default()
            },
        };
        assert!(validate_new_blog(&new).is_err());
    }
}
