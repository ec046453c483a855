/**
 * Authentication Routes
 * Login and public self-registration
 */
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::DEFAULT_COST;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::mint_session_token;
use crate::db::{
    self, activity,
    models::{EntityType, NotificationKind, Role, User},
    notifications, users,
};
use crate::error::ApiError;
use crate::routes::{is_valid_email, DataBody};

/// Session cookie lifetime, matching the token expiry.
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated user as returned to the dashboard.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
            avatar: user.avatar,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Run bcrypt off the async executor; it is CPU-intensive by design.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking panic during hash: {}", e);
            ApiError::Internal("Failed to process password".to_string())
        })?
        .map_err(|e| {
            tracing::error!("failed to hash password: {}", e);
            ApiError::Internal("Failed to process password".to_string())
        })
}

async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
///
/// Unknown email, inactive account, and password mismatch all produce the
/// same generic 401 so the response does not leak which one failed.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let pool = db::pool()?;

    let user = users::find_by_email(pool.as_ref(), &payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !verify_password(payload.password, user.password_hash.clone()).await {
        tracing::warn!("failed login attempt for: {}", user.email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = mint_session_token(user.id, user.role(), user.avatar.as_deref()).map_err(|e| {
        tracing::error!("failed to mint session token: {}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;

    tracing::info!("successful login for user: {}", user.email);

    let cookie = format!(
        "session={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        token, SESSION_COOKIE_MAX_AGE_SECS
    );

    let body = LoginResponse {
        user: SessionUser::from(user),
        token,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// POST /api/auth/register
///
/// Public self-registration. Role defaults to content_admin; a welcome
/// notification and an audit entry are written after the insert.
pub async fn register(
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty()
        || payload.email.is_empty()
        || payload.password.is_empty()
    {
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
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(payload.password).await?;

    let record = users::NewUserRecord {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role.unwrap_or(Role::ContentAdmin),
        invited_by: None,
    };

    let user = users::insert(pool.as_ref(), &record).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("User already exists".to_string())
        } else {
            e.into()
        }
    })?;

    activity::record(
        user.id,
        "Registered",
        EntityType::User,
        Some(user.id.to_string()),
        format!("User registered: {} ({})", user.name, user.email),
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

    let body = DataBody {
        data: SessionUser::from(user),
    };

    Ok((StatusCode::CREATED, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn auth_router() -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
    }

    async fn post_json(app: Router, uri: &str, json: &impl serde::Serialize) -> StatusCode {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[test]
    fn test_session_user_from_row_resolves_role_and_drops_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: "super_admin".to_string(),
            avatar: Some("a.png".to_string()),
            is_active: true,
            is_protected: false,
            invited_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let session_user = SessionUser::from(user);
        assert_eq!(session_user.role, Role::SuperAdmin);
        assert_eq!(session_user.email, "ada@example.com");
        let json = serde_json::to_string(&session_user).unwrap();
        assert!(!json.contains("hash"));
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        let status = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "".to_string(),
                password: "secret".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_missing_fields_returns_bad_request() {
        let status = post_json(
            auth_router(),
            "/api/auth/register",
            &RegisterRequest {
                name: "".to_string(),
                email: "a@x.com".to_string(),
                password: "abcdef".to_string(),
                role: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_invalid_email_returns_bad_request() {
        let status = post_json(
            auth_router(),
            "/api/auth/register",
            &RegisterRequest {
                name: "A".to_string(),
                email: "not-an-email".to_string(),
                password: "abcdef".to_string(),
                role: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_short_password_returns_bad_request() {
        let status = post_json(
            auth_router(),
            "/api/auth/register",
            &RegisterRequest {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                password: "abc".to_string(),
                role: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
