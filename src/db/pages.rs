//! Page store. All writes that can affect `published_at` go through here so
//! the publish-once rule cannot be bypassed by a handler.

use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{next_published_at, ContentStatus, Page, SeoMeta};

const COLS: &str = "id, title, slug, content, excerpt, featured_image, status, seo, \
                    created_by, updated_by, published_at, created_at, updated_at";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    #[serde(default = "ContentStatus::default_draft")]
    pub status: ContentStatus,
    #[serde(default)]
    pub seo: SeoMeta,
}

/// Partial update. Absent fields keep their current value; optional columns
/// (`excerpt`, `featuredImage`) cannot be cleared back to null through a
/// patch, only overwritten.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<ContentStatus>,
    pub seo: Option<SeoMeta>,
}

pub async fn list_all(pool: &PgPool) -> sqlx::Result<Vec<Page>> {
    sqlx::query_as::<_, Page>(&format!(
        "SELECT {COLS} FROM pages ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> sqlx::Result<Vec<Page>> {
    sqlx::query_as::<_, Page>(&format!(
        "SELECT {COLS} FROM pages WHERE created_by = $1 ORDER BY created_at DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Page>> {
    sqlx::query_as::<_, Page>(&format!("SELECT {COLS} FROM pages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pages WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &PgPool, new: &NewPage, actor: Uuid) -> sqlx::Result<Page> {
    let published_at = if new.status == ContentStatus::Published {
        Some(chrono::Utc::now())
    } else {
        None
    };

    sqlx::query_as::<_, Page>(&format!(
        r#"
        INSERT INTO pages
            (title, slug, content, excerpt, featured_image, status, seo,
             created_by, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.slug)
    .bind(&new.content)
    .bind(&new.excerpt)
    .bind(&new.featured_image)
    .bind(new.status.as_str())
    .bind(Json(new.seo.clone()))
    .bind(actor)
    .bind(published_at)
    .fetch_one(pool)
    .await
}

/// Apply a patch on top of the current row. `created_by` is never touched.
pub async fn update(
    pool: &PgPool,
    existing: &Page,
    patch: PagePatch,
    actor: Uuid,
) -> sqlx::Result<Page> {
    let new_status = patch.status.unwrap_or_else(|| existing.status());
    let published_at = next_published_at(existing.status(), existing.published_at, new_status);

    let title = patch.title.unwrap_or_else(|| existing.title.clone());
    let slug = patch.slug.unwrap_or_else(|| existing.slug.clone());
    let content = patch.content.unwrap_or_else(|| existing.content.clone());
    let excerpt = patch.excerpt.or_else(|| existing.excerpt.clone());
    let featured_image = patch.featured_image.or_else(|| existing.featured_image.clone());
    let seo = patch.seo.unwrap_or_else(|| existing.seo.0.clone());

    sqlx::query_as::<_, Page>(&format!(
        r#"
        UPDATE pages
        SET title = $1, slug = $2, content = $3, excerpt = $4, featured_image = $5,
            status = $6, seo = $7, published_at = $8, updated_by = $9, updated_at = now()
        WHERE id = $10
        RETURNING {COLS}
        "#
    ))
    .bind(&title)
    .bind(&slug)
    .bind(&content)
    .bind(&excerpt)
    .bind(&featured_image)
    .bind(new_status.as_str())
    .bind(Json(seo))
    .bind(published_at)
    .bind(actor)
    .bind(existing.id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM pages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_published(pool: &PgPool, limit: i64) -> sqlx::Result<Vec<Page>> {
    sqlx::query_as::<_, Page>(&format!(
        "SELECT {COLS} FROM pages WHERE status = 'published' ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn find_published_by_slug(pool: &PgPool, slug: &str) -> sqlx::Result<Option<Page>> {
    sqlx::query_as::<_, Page>(&format!(
        "SELECT {COLS} FROM pages WHERE slug = $1 AND status = 'published'"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}
