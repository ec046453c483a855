/**
 * Activity Log Routes
 * Read-only audit trail for the dashboard
 */
use axum::{extract::Query, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::db::{self, activity, models::ActivityLog, models::Role};
use crate::error::ApiError;
use crate::routes::DataBody;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub entity_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLog> for ActivityLogResponse {
    fn from(log: ActivityLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            action: log.action,
            entity_type: log.entity_type,
            entity_id: log.entity_id,
            details: log.details,
            created_at: log.created_at,
        }
    }
}

/// GET /api/activity-logs
///
/// Super admins see the full trail; content admins only their own entries.
pub async fn list_activity_logs(
    session: AuthSession,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let scope_user = match session.role {
        Role::SuperAdmin => None,
        Role::ContentAdmin => Some(session.user_id),
    };

    let pool = db::pool()?;
    let logs = activity::list(
        pool.as_ref(),
        scope_user,
        query.entity_type.as_deref(),
        limit,
    )
    .await?;

    let data: Vec<ActivityLogResponse> = logs.into_iter().map(Into::into).collect();
    Ok(Json(DataBody { data }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_list_without_session_returns_unauthorized() {
        let app = Router::new().route("/api/activity-logs", get(list_activity_logs));
        let req = Request::get("/api/activity-logs")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
