/**
 * Analytics Routes
 * Public view tracking and the authenticated dashboard summary
 */
use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::AuthSession;
use crate::db::{self, analytics};
use crate::error::ApiError;
use crate::routes::SuccessBody;

const DEFAULT_WINDOW_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

/// POST /api/analytics - unauthenticated tracking beacon
pub async fn track(
    headers: HeaderMap,
    Json(payload): Json<TrackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.page_url.trim().is_empty() {
        return Err(ApiError::Validation("pageUrl is required".to_string()));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (device, browser) = analytics::classify_user_agent(&user_agent);

    let event = analytics::NewEvent {
        page_url: payload.page_url,
        page_title: payload.page_title,
        referrer: payload.referrer,
        session_id: payload.session_id,
        country: payload.country,
        user_agent,
        device,
        browser,
    };

    let pool = db::pool()?;
    analytics::insert(pool.as_ref(), &event).await?;

    Ok((StatusCode::CREATED, Json(SuccessBody { success: true })))
}

/// GET /api/analytics - aggregated dashboard summary
pub async fn summary(
    _session: AuthSession,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query
        .days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .clamp(1, MAX_WINDOW_DAYS);

    let pool = db::pool()?;
    let summary = analytics::summarize(pool.as_ref(), days).await?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn analytics_router() -> Router {
        Router::new().route("/api/analytics", get(summary).post(track))
    }

    #[tokio::test]
    async fn test_summary_without_session_returns_unauthorized() {
        let req = Request::get("/api/analytics").body(Body::empty()).unwrap();
        let res = analytics_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_track_empty_page_url_returns_bad_request() {
        let req = Request::post("/api/analytics")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"pageUrl":"  "}"#))
            .unwrap();
        let res = analytics_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
