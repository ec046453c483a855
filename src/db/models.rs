//! Database models - structs representing database tables (used by sqlx/serde)
//! plus the closed role/status enumerations shared across the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Staff role. Permission logic is written against this enum, never against
/// raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ContentAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::ContentAdmin => "content_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "content_admin" => Some(Role::ContentAdmin),
            _ => None,
        }
    }
}

/// Lifecycle status shared by pages and blogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<ContentStatus> {
        match s {
            "draft" => Some(ContentStatus::Draft),
            "published" => Some(ContentStatus::Published),
            "archived" => Some(ContentStatus::Archived),
            _ => None,
        }
    }

    /// Serde default for create payloads that omit `status`.
    pub(crate) fn default_draft() -> ContentStatus {
        ContentStatus::Draft
    }
}

/// Entity kind recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Page,
    Blog,
    User,
    Settings,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Page => "page",
            EntityType::Blog => "blog",
            EntityType::User => "user",
            EntityType::Settings => "settings",
        }
    }
}

/// Notification severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

// ============================================================================
// Rows
// ============================================================================

/// Staff account. `password_hash` never leaves the store layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_protected: bool,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Unknown role strings decode as the least-privileged role.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::ContentAdmin)
    }
}

/// SEO metadata stored as a JSONB document on pages and blogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: String,
    pub seo: Json<SeoMeta>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn status(&self) -> ContentStatus {
        ContentStatus::parse(&self.status).unwrap_or(ContentStatus::Draft)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub seo: Json<SeoMeta>,
    pub views: i64,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn status(&self) -> ContentStatus {
        ContentStatus::parse(&self.status).unwrap_or(ContentStatus::Draft)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: String,
    pub device: String,
    pub browser: String,
    pub country: Option<String>,
    pub session_id: Option<String>,
    pub visit_date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// publishedAt rule
// ============================================================================

/// Compute the `published_at` value an update must carry.
///
/// The timestamp is set exactly once, on the first transition into
/// `published`. Re-saving an already-published record, or re-publishing an
/// archived one that was published before, keeps the original timestamp.
/// Centralized here so no write path can bypass the rule.
pub fn next_published_at(
    current_status: ContentStatus,
    current_published_at: Option<DateTime<Utc>>,
    new_status: ContentStatus,
) -> Option<DateTime<Utc>> {
    if new_status == ContentStatus::Published
        && current_status != ContentStatus::Published
        && current_published_at.is_none()
    {
        Some(Utc::now())
    } else {
        current_published_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("content_admin"), Some(Role::ContentAdmin));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::SuperAdmin.as_str(), "super_admin");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Published,
            ContentStatus::Archived,
        ] {
            assert_eq!(ContentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ContentStatus::parse("live"), None);
    }

    #[test]
    fn test_first_publish_sets_timestamp() {
        let result = next_published_at(ContentStatus::Draft, None, ContentStatus::Published);
        assert!(result.is_some());
    }

    #[test]
    fn test_republish_keeps_original_timestamp() {
        let original = Utc::now() - chrono::Duration::days(7);
        let result = next_published_at(
            ContentStatus::Published,
            Some(original),
            ContentStatus::Published,
        );
        assert_eq!(result, Some(original));
    }

    #[test]
    fn test_archive_then_publish_keeps_original_timestamp() {
        let original = Utc::now() - chrono::Duration::days(7);
        let result = next_published_at(
            ContentStatus::Archived,
            Some(original),
            ContentStatus::Published,
        );
        assert_eq!(result, Some(original));
    }

    #[test]
    fn test_draft_save_leaves_timestamp_unset() {
        let result = next_published_at(ContentStatus::Draft, None, ContentStatus::Draft);
        assert!(result.is_none());
    }
}
