/**
 * Notification Routes
 * Per-user notification feed and read-state updates
 */
use axum::{extract::Query, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::db::{self, models::Notification, notifications};
use crate::error::ApiError;
use crate::routes::SuccessBody;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            kind: n.kind,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: Option<Uuid>,
    pub mark_all_as_read: Option<bool>,
}

/// GET /api/notifications
pub async fn list_notifications(
    session: AuthSession,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let pool = db::pool()?;

    let items =
        notifications::list(pool.as_ref(), session.user_id, query.unread_only, limit).await?;
    let unread_count = notifications::unread_count(pool.as_ref(), session.user_id).await?;

    Ok(Json(NotificationListResponse {
        notifications: items.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// POST /api/notifications
///
/// Marks one notification read, or all of them. A body naming neither is a
/// no-op that still reports success.
pub async fn mark_read(
    session: AuthSession,
    Json(payload): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = db::pool()?;

    if payload.mark_all_as_read == Some(true) {
        notifications::mark_all_read(pool.as_ref(), session.user_id).await?;
    } else if let Some(id) = payload.notification_id {
        notifications::mark_read(pool.as_ref(), id, session.user_id).await?;
    }

    Ok(Json(SuccessBody { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn notifications_router() -> Router {
        Router::new().route("/api/notifications", get(list_notifications).post(mark_read))
    }

    #[tokio::test]
    async fn test_list_without_session_returns_unauthorized() {
        let req = Request::get("/api/notifications")
            .body(Body::empty())
            .unwrap();
        let res = notifications_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mark_read_without_session_returns_unauthorized() {
        let req = Request::post("/api/notifications")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"markAllAsRead":true}"#))
            .unwrap();
        let res = notifications_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
