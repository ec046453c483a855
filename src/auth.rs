//! Session tokens and request identity.
//!
//! A successful login mints a 30-day JWT carrying the user id, role, and
//! avatar. Protected handlers receive the verified identity as an explicit
//! [`AuthSession`] argument via the axum extractor; nothing reads session
//! state from globals.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Role;
use crate::error::ApiError;

lazy_static::lazy_static! {
    /// JWT signing secret from environment.
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "default-jwt-secret-change-in-production".to_string());
}

/// Session lifetime in days.
const SESSION_TTL_DAYS: i64 = 30;

/// JWT claims carried by the session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Verified request identity, threaded into every protected handler.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub role: Role,
    pub avatar: Option<String>,
}

/// Mint a session token for an authenticated user.
pub fn mint_session_token(
    user_id: Uuid,
    role: Role,
    avatar: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        avatar: avatar.map(|s| s.to_string()),
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
}

/// Verify and decode a session token.
pub fn verify_session_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(|c| c.trim())
                .find_map(|c| c.strip_prefix("session="))
                .map(|s| s.to_string())
        })
}

/// Resolve a session from the Authorization header or the `session` cookie.
pub fn session_from_headers(headers: &HeaderMap) -> Option<AuthSession> {
    let token = bearer_token(headers).or_else(|| session_cookie(headers))?;
    let claims = verify_session_token(&token).ok()?;
    let user_id = Uuid::parse_str(&claims.sub).ok()?;
    let role = Role::parse(&claims.role)?;
    Some(AuthSession {
        user_id,
        role,
        avatar: claims.avatar,
    })
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers).ok_or_else(ApiError::unauthorized)
    }
}

/// Minimal query-string escaping for the signin redirect target.
fn encode_redirect_target(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Route protection for browser-facing paths.
///
/// Unauthenticated requests under `/dashboard` are redirected to the sign-in
/// page with a `from` parameter; authenticated requests to `/auth` pages are
/// redirected back to the dashboard. API routes enforce auth through the
/// [`AuthSession`] extractor instead.
pub async fn route_guard(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let is_auth_page = path.starts_with("/auth");
    let is_dashboard = path.starts_with("/dashboard");

    if is_auth_page || is_dashboard {
        let authed = session_from_headers(request.headers()).is_some();

        if is_auth_page && authed {
            return Redirect::temporary("/dashboard").into_response();
        }

        if is_dashboard && !authed {
            let mut from = path.to_string();
            if let Some(query) = request.uri().query() {
                from.push('?');
                from.push_str(query);
            }
            let target = format!("/auth/signin?from={}", encode_redirect_target(&from));
            return Redirect::temporary(&target).into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_round_trip_carries_identity() {
        let user_id = Uuid::new_v4();
        let token = mint_session_token(user_id, Role::SuperAdmin, Some("avatar.png")).unwrap();
        let claims = verify_session_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "super_admin");
        assert_eq!(claims.avatar.as_deref(), Some("avatar.png"));
    }

    #[test]
    fn test_token_expiry_is_thirty_days() {
        let token = mint_session_token(Uuid::new_v4(), Role::ContentAdmin, None).unwrap();
        let claims = verify_session_token(&token).unwrap();
        let ttl = claims.exp - claims.iat;
        assert_eq!(ttl, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        assert!(verify_session_token("not.a.token").is_err());
    }

    #[test]
    fn test_session_from_bearer_header() {
        let token = mint_session_token(Uuid::new_v4(), Role::ContentAdmin, None).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let session = session_from_headers(&headers).unwrap();
        assert_eq!(session.role, Role::ContentAdmin);
    }

    #[test]
    fn test_session_from_cookie() {
        let token = mint_session_token(Uuid::new_v4(), Role::SuperAdmin, None).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={}", token)).unwrap(),
        );
        let session = session_from_headers(&headers).unwrap();
        assert_eq!(session.role, Role::SuperAdmin);
    }

    #[test]
    fn test_no_credentials_yields_no_session() {
        assert!(session_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_encode_redirect_target() {
        assert_eq!(
            encode_redirect_target("/dashboard/pages?tab=drafts"),
            "/dashboard/pages%3Ftab%3Ddrafts"
        );
    }
}
