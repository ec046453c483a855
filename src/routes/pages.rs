/**
 * Page Routes
 * Authenticated CRUD for static pages, with ownership enforcement
 */
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::db::{
    self, activity,
    models::{ContentStatus, EntityType, Page, Role, SeoMeta},
    pages::{NewPage, PagePatch},
};
use crate::error::ApiError;
use crate::permissions::can_manage_content;
use crate::routes::{is_valid_slug, DataBody, SuccessBody};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: ContentStatus,
    pub seo: SeoMeta,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        let status = page.status();
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            content: page.content,
            excerpt: page.excerpt,
            featured_image: page.featured_image,
            status,
            seo: page.seo.0,
            created_by: page.created_by,
            updated_by: page.updated_by,
            published_at: page.published_at,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

fn validate_new_page(new: &NewPage) -> Result<(), ApiError> {
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
    if new.seo.title.trim().is_empty() || new.seo.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "SEO title and description are required".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/pages - all pages for super admins, own pages for content admins
pub async fn list_pages(session: AuthSession) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let pages = match session.role {
        Role::SuperAdmin => db::pages::list_all(pool.as_ref()).await?,
        Role::ContentAdmin => db::pages::list_by_owner(pool.as_ref(), session.user_id).await?,
    };

    let data: Vec<PageResponse> = pages.into_iter().map(Into::into).collect();
    Ok(Json(DataBody { data }))
}

/// GET /api/pages/:id
pub async fn get_page(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let page = db::pages::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    if !can_manage_content(session.role, page.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    Ok(Json(DataBody {
        data: PageResponse::from(page),
    }))
}

/// POST /api/pages
pub async fn create_page(
    session: AuthSession,
    Json(payload): Json<NewPage>,
) -> Result<impl IntoResponse, ApiError> {
    validate_new_page(&payload)?;

    let pool = db::pool()?;

    if db::pages::slug_exists(pool.as_ref(), &payload.slug).await? {
        return Err(ApiError::Conflict(
            "A page with this slug already exists".to_string(),
        ));
    }

    let page = db::pages::insert(pool.as_ref(), &payload, session.user_id)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A page with this slug already exists".to_string())
            } else {
                e.into()
            }
        })?;

    activity::record(
        session.user_id,
        "Created page",
        EntityType::Page,
        Some(page.id.to_string()),
        format!("Created page: {}", page.title),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataBody {
            data: PageResponse::from(page),
        }),
    ))
}

/// PATCH /api/pages/:id
pub async fn update_page(
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<PagePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let existing = db::pages::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    if !can_manage_content(session.role, existing.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    if let Some(slug) = &patch.slug {
        if !is_valid_slug(slug) {
            return Err(ApiError::Validation(
                "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
            ));
        }
        if slug != &existing.slug && db::pages::slug_exists(pool.as_ref(), slug).await? {
            return Err(ApiError::Conflict(
                "A page with this slug already exists".to_string(),
            ));
        }
    }

    let page = db::pages::update(pool.as_ref(), &existing, patch, session.user_id)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A page with this slug already exists".to_string())
            } else {
                e.into()
            }
        })?;

    activity::record(
        session.user_id,
        "Updated page",
        EntityType::Page,
        Some(page.id.to_string()),
        format!("Updated page: {}", page.title),
    )
    .await;

    Ok(Json(DataBody {
        data: PageResponse::from(page),
    }))
}

/// DELETE /api/pages/:id
pub async fn delete_page(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    let page = db::pages::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    if !can_manage_content(session.role, page.created_by, session.user_id) {
        return Err(ApiError::forbidden());
    }

    db::pages::delete(pool.as_ref(), id).await?;

    activity::record(
        session.user_id,
        "Deleted page",
        EntityType::Page,
        Some(id.to_string()),
        format!("Deleted page: {}", page.title),
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

    fn pages_router() -> Router {
        Router::new()
            .route("/api/pages", get(list_pages).post(create_page))
            .route(
                "/api/pages/{id}",
                get(get_page).patch(update_page).delete(delete_page),
            )
    }

    #[tokio::test]
    async fn test_list_without_session_returns_unauthorized() {
        let req = Request::get("/api/pages").body(Body::empty()).unwrap();
        let res = pages_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_without_session_returns_unauthorized() {
        let req = Request::post("/api/pages")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title":"T","slug":"t","content":"c"}"#))
            .unwrap();
        let res = pages_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_without_session_returns_unauthorized() {
        let req = Request::delete(format!("/api/pages/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let res = pages_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validate_new_page_requires_seo() {
        let new = NewPage {
            title: "T".to_string(),
            slug: "t".to_string(),
            content: "c".to_string(),
            excerpt: None,
            featured_image: None,
            status: ContentStatus::Draft,
            seo: SeoMeta::default(),
        };
        assert!(validate_new_page(&new).is_err());
    }

    #[test]
    fn test_validate_new_page_rejects_bad_slug() {
        let new = NewPage {
            title: "T".to_string(),
            slug: "Not A Slug".to_string(),
            content: "c".to_string(),
            excerpt: None,
            featured_image: None,
            status: ContentStatus::Draft,
            seo: SeoMeta {
                title: "t".to_string(),
                description: "d".to_string(),
                ..SeoMeta::default()
            },
        };
        assert!(validate_new_page(&new).is_err());
    }
}
