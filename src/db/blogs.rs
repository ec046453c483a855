//! Blog store. Same contract as the page store plus author/category/tag
//! fields and the public view counter.

use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{next_published_at, Blog, ContentStatus, SeoMeta};

const COLS: &str = "id, title, slug, content, excerpt, featured_image, author, categories, \
                    tags, status, seo, views, created_by, updated_by, published_at, \
                    created_at, updated_at";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
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
pub struct BlogPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub seo: Option<SeoMeta>,
}

/// Filters accepted by the public listing endpoint.
#[derive(Debug, Default)]
pub struct PublicBlogFilter {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

pub async fn list_all(pool: &PgPool) -> sqlx::Result<Vec<Blog>> {
    sqlx::query_as::<_, Blog>(&format!(
        "SELECT {COLS} FROM blogs ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> sqlx::Result<Vec<Blog>> {
    sqlx::query_as::<_, Blog>(&format!(
        "SELECT {COLS} FROM blogs WHERE created_by = $1 ORDER BY created_at DESC"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Blog>> {
    sqlx::query_as::<_, Blog>(&format!("SELECT {COLS} FROM blogs WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM blogs WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &PgPool, new: &NewBlog, actor: Uuid) -> sqlx::Result<Blog> {
    let published_at = if new.status == ContentStatus::Published {
        Some(chrono::Utc::now())
    } else {
        None
    };

    sqlx::query_as::<_, Blog>(&format!(
        r#"
        INSERT INTO blogs
            (title, slug, content, excerpt, featured_image, author, categories, tags,
             status, seo, created_by, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {COLS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.slug)
    .bind(&new.content)
    .bind(&new.excerpt)
    .bind(&new.featured_image)
    .bind(&new.author)
    .bind(&new.categories)
    .bind(&new.tags)
    .bind(new.status.as_str())
    .bind(Json(new.seo.clone()))
    .bind(actor)
    .bind(published_at)
    .fetch_one(pool)
    .await
}

/// Apply a patch on top of the current row. `created_by` and `views` are
/// never touched by the authenticated update path.
pub async fn update(
    pool: &PgPool,
    existing: &Blog,
    patch: BlogPatch,
    actor: Uuid,
) -> sqlx::Result<Blog> {
    let new_status = patch.status.unwrap_or_else(|| existing.status());
    let published_at = next_published_at(existing.status(), existing.published_at, new_status);

    let title = patch.title.unwrap_or_else(|| existing.title.clone());
    let slug = patch.slug.unwrap_or_else(|| existing.slug.clone());
    let content = patch.content.unwrap_or_else(|| existing.content.clone());
    let excerpt = patch.excerpt.or_else(|| existing.excerpt.clone());
    let featured_image = patch.featured_image.or_else(|| existing.featured_image.clone());
    let author = patch.author.unwrap_or_else(|| existing.author.clone());
    let categories = patch.categories.unwrap_or_else(|| existing.categories.clone());
    let tags = patch.tags.unwrap_or_else(|| existing.tags.clone());
    let seo = patch.seo.unwrap_or_else(|| existing.seo.0.clone());

    sqlx::query_as::<_, Blog>(&format!(
        r#"
        UPDATE blogs
        SET title = $1, slug = $2, content = $3, excerpt = $4, featured_image = $5,
            author = $6, categories = $7, tags = $8, status = $9, seo = $10,
            published_at = $11, updated_by = $12, updated_at = now()
        WHERE id = $13
        RETURNING {COLS}
        "#
    ))
    .bind(&title)
    .bind(&slug)
    .bind(&content)
    .bind(&excerpt)
    .bind(&featured_image)
    .bind(&author)
    .bind(&categories)
    .bind(&tags)
    .bind(new_status.as_str())
    .bind(Json(seo))
    .bind(published_at)
    .bind(actor)
    .bind(existing.id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn push_public_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a PublicBlogFilter) {
    qb.push(" WHERE status = 'published'");

    if let Some(category) = &filter.category {
        qb.push(" AND ");
        qb.push_bind(category);
        qb.push(" = ANY(categories)");
    }

    if let Some(tag) = &filter.tag {
        qb.push(" AND ");
        qb.push_bind(tag);
        qb.push(" = ANY(tags)");
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR excerpt ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR content ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

/// Published blogs for the public site, with pagination, substring search and
/// category/tag filters. Returns the page of rows plus the total match count.
pub async fn list_published(
    pool: &PgPool,
    filter: &PublicBlogFilter,
) -> sqlx::Result<(Vec<Blog>, i64)> {
    let offset = (filter.page - 1) * filter.limit;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLS} FROM blogs"));
    push_public_filters(&mut qb, filter);
    qb.push(" ORDER BY published_at DESC NULLS LAST LIMIT ");
    qb.push_bind(filter.limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let blogs = qb.build_query_as::<Blog>().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blogs");
    push_public_filters(&mut count_qb, filter);
    let total = count_qb
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok((blogs, total))
}

pub async fn find_published_by_slug(pool: &PgPool, slug: &str) -> sqlx::Result<Option<Blog>> {
    sqlx::query_as::<_, Blog>(&format!(
        "SELECT {COLS} FROM blogs WHERE slug = $1 AND status = 'published'"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// Every public single-item fetch counts as one view; repeated fetches are
/// counted again on purpose.
pub async fn increment_views(pool: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("UPDATE blogs SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
