/**
 * User Management Routes
 * Super-admin only CRUD over accounts, with protected-user safeguards
 */
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::db::{
    self, activity,
    models::{EntityType, NotificationKind, Role, User},
    notifications, users,
};
use crate::error::ApiError;
use crate::permissions::protected_patch_rejected;
use crate::routes::auth::hash_password;
use crate::routes::{is_valid_email, DataBody, SuccessBody};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial update. Absent fields keep their current value; `avatar` cannot
/// be cleared back to null through a patch, only overwritten.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub avatar: Option<String>,
    pub is_active: Option<bool>,
    pub is_protected: Option<bool>,
}

/// Account as exposed over the API. The password hash never leaves the store
/// layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
            avatar: user.avatar,
            is_active: user.is_active,
            is_protected: user.is_protected,
            invited_by: user.invited_by,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn require_super_admin(session: &AuthSession) -> Result<(), ApiError> {
    match session.role {
        Role::SuperAdmin => Ok(()),
        Role::ContentAdmin => Err(ApiError::forbidden()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/users
pub async fn list_users(session: AuthSession) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&session)?;

    let pool = db::pool()?;
    let users = users::list(pool.as_ref()).await?;

    let data: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(DataBody { data }))
}

/// GET /api/users/:id
pub async fn get_user(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&session)?;

    let pool = db::pool()?;
    let user = users::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(DataBody {
        data: UserResponse::from(user),
    }))
}

/// POST /api/users
///
/// Invitation flow: the new account records who created it, receives a
/// welcome notification, and the inviter gets a confirmation.
pub async fn create_user(
    session: AuthSession,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&session)?;

    if payload.name.trim().is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    let pool = db::pool()?;

    if users::email_exists(pool.as_ref(), &payload.email).await? {
        return Err(ApiError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(payload.password).await?;

    let record = users::NewUserRecord {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role.unwrap_or(Role::ContentAdmin),
        invited_by: Some(session.user_id),
    };

    let user = users::insert(pool.as_ref(), &record).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("A user with this email already exists".to_string())
        } else {
            e.into()
        }
    })?;

    activity::record(
        session.user_id,
        "Created user",
        EntityType::User,
        Some(user.id.to_string()),
        format!("Created user: {} ({})", user.name, user.email),
    )
    .await;

    notifications::notify(
        user.id,
        "Welcome to the dashboard!",
        &format!(
            "Hello {}! Your account has been created and you can now start managing your content.",
            user.name
        ),
        NotificationKind::Success,
    )
    .await;

    notifications::notify(
        session.user_id,
        "User created",
        &format!("Account for {} ({}) was created.", user.name, user.email),
        NotificationKind::Info,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataBody {
            data: UserResponse::from(user),
        }),
    ))
}

/// PATCH /api/users/:id
///
/// Protected accounts accept only name and password changes; everyone else
/// is fully editable. `isProtected: false` is dropped silently regardless of
/// target, so protection can be granted through the API but never revoked.
pub async fn update_user(
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(mut patch): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&session)?;

    let pool = db::pool()?;

    let existing = users::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if existing.is_protected && protected_patch_rejected(&patch) {
        return Err(ApiError::Forbidden(
            "This user is protected. Only name and password can be updated.".to_string(),
        ));
    }

    if patch.is_protected == Some(false) {
        patch.is_protected = None;
    }

    if let Some(email) = &patch.email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        if !email.eq_ignore_ascii_case(&existing.email)
            && users::email_exists(pool.as_ref(), email).await?
        {
            return Err(ApiError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
    }

    let password_hash = match patch.password {
        Some(password) => {
            if password.len() < 6 {
                return Err(ApiError::Validation(
                    "Password must be at least 6 characters long".to_string(),
                ));
            }
            hash_password(password).await?
        }
        None => existing.password_hash.clone(),
    };

    let current_role = existing.role();
    let resolved = users::UserUpdate {
        name: patch.name.unwrap_or(existing.name),
        email: patch.email.unwrap_or(existing.email),
        password_hash,
        role: patch.role.unwrap_or(current_role),
        avatar: patch.avatar.or(existing.avatar),
        is_active: patch.is_active.unwrap_or(existing.is_active),
        is_protected: patch.is_protected.unwrap_or(existing.is_protected),
    };

    let user = users::update(pool.as_ref(), id, &resolved)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A user with this email already exists".to_string())
            } else {
                e.into()
            }
        })?;

    activity::record(
        session.user_id,
        "Updated user",
        EntityType::User,
        Some(user.id.to_string()),
        format!("Updated user: {} ({})", user.name, user.email),
    )
    .await;

    Ok(Json(DataBody {
        data: UserResponse::from(user),
    }))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&session)?;

    let pool = db::pool()?;

    let user = users::find(pool.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.is_protected {
        return Err(ApiError::Forbidden(
            "This user is protected and cannot be deleted".to_string(),
        ));
    }

    users::delete(pool.as_ref(), id).await?;

    activity::record(
        session.user_id,
        "Deleted user",
        EntityType::User,
        Some(id.to_string()),
        format!("Deleted user: {} ({})", user.name, user.email),
    )
    .await;

    Ok(Json(SuccessBody { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::mint_session_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn users_router() -> Router {
        Router::new()
            .route("/api/users", get(list_users).post(create_user))
            .route(
                "/api/users/{id}",
                get(get_user).patch(update_user).delete(delete_user),
            )
    }

    #[tokio::test]
    async fn test_list_without_session_returns_unauthorized() {
        let req = Request::get("/api/users").body(Body::empty()).unwrap();
        let res = users_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_as_content_admin_returns_forbidden() {
        let token = mint_session_token(Uuid::new_v4(), Role::ContentAdmin, None).unwrap();
        let req = Request::get("/api/users")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = users_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_as_content_admin_returns_forbidden() {
        let token = mint_session_token(Uuid::new_v4(), Role::ContentAdmin, None).unwrap();
        let req = Request::delete(format!("/api/users/{}", Uuid::new_v4()))
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = users_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
