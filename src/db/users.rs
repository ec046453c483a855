//! User account store. Password hashes stay inside this layer; route
//! responses are built from explicit projections that exclude them.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Role, User};

const COLS: &str = "id, name, email, password_hash, role, avatar, is_active, is_protected, \
                    invited_by, created_at, updated_at";

/// Resolved values for a user insert; the caller hashes the password first.
#[derive(Debug)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub invited_by: Option<Uuid>,
}

/// Fully resolved values for a user update. The route layer merges the patch
/// with the current row (and applies the protected-user gate) before calling
/// [`update`].
#[derive(Debug)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_protected: bool,
}

pub async fn list(pool: &PgPool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn insert(pool: &PgPool, new: &NewUserRecord) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash, role, invited_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.role.as_str())
    .bind(new.invited_by)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, update: &UserUpdate) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = $1, email = $2, password_hash = $3, role = $4, avatar = $5,
            is_active = $6, is_protected = $7, updated_at = now()
        WHERE id = $8
        RETURNING {COLS}
        "#
    ))
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.password_hash)
    .bind(update.role.as_str())
    .bind(&update.avatar)
    .bind(update.is_active)
    .bind(update.is_protected)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
