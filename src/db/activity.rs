//! Append-only audit trail.
//!
//! Recording is best-effort by contract: the primary write has already
//! committed when [`record`] runs, and an audit failure is logged and
//! swallowed rather than rolled back.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{ActivityLog, EntityType};

/// Append one audit entry. Never fails the calling request.
pub async fn record(
    user_id: Uuid,
    action: &str,
    entity_type: EntityType,
    entity_id: Option<String>,
    details: String,
) {
    let Some(pool) = super::get_pool() else {
        tracing::warn!(action, "activity log skipped: database not available");
        return;
    };

    let result = sqlx::query(
        r#"
        INSERT INTO activity_logs (user_id, action, entity_type, entity_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(entity_type.as_str())
    .bind(&entity_id)
    .bind(&details)
    .execute(pool.as_ref())
    .await;

    if let Err(e) = result {
        tracing::warn!(action, "failed to append activity log entry: {}", e);
    }
}

/// Newest-first listing. `scope_user` restricts to one actor (content admins
/// only see their own trail); `entity_type` is an optional filter.
pub async fn list(
    pool: &PgPool,
    scope_user: Option<Uuid>,
    entity_type: Option<&str>,
    limit: i64,
) -> sqlx::Result<Vec<ActivityLog>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT id, user_id, action, entity_type, entity_id, details, created_at \
         FROM activity_logs WHERE true",
    );

    if let Some(user_id) = scope_user {
        qb.push(" AND user_id = ");
        qb.push_bind(user_id);
    }

    if let Some(entity_type) = entity_type {
        qb.push(" AND entity_type = ");
        qb.push_bind(entity_type.to_string());
    }

    qb.push(" ORDER BY created_at DESC LIMIT ");
    qb.push_bind(limit);

    qb.build_query_as::<ActivityLog>().fetch_all(pool).await
}
