//! System-generated user notifications. Created only as a side effect of
//! other operations; the only mutation is marking read.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Notification, NotificationKind};

const COLS: &str = "id, user_id, title, message, kind, is_read, created_at, updated_at";

/// Insert a notification, fire-and-forget. Like the activity log, a failed
/// notification write never fails the operation that triggered it.
pub async fn notify(user_id: Uuid, title: &str, message: &str, kind: NotificationKind) {
    let Some(pool) = super::get_pool() else {
        tracing::warn!(title, "notification skipped: database not available");
        return;
    };

    let result = sqlx::query(
        "INSERT INTO notifications (user_id, title, message, kind) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(kind.as_str())
    .execute(pool.as_ref())
    .await;

    if let Err(e) = result {
        tracing::warn!(title, "failed to create notification: {}", e);
    }
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
) -> sqlx::Result<Vec<Notification>> {
    if unread_only {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLS} FROM notifications WHERE user_id = $1 AND is_read = false \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Mark one notification read. Scoped to the owning user: the id of another
/// user's notification matches zero rows.
pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true, updated_at = now() \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Mark everything read for one user. Idempotent.
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true, updated_at = now() \
         WHERE user_id = $1 AND is_read = false",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
