//! Page-view analytics: append-only ingestion plus grouped aggregation for
//! the dashboard.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// One tracked page view, fully classified and ready to insert.
#[derive(Debug)]
pub struct NewEvent {
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub country: Option<String>,
    pub user_agent: String,
    pub device: &'static str,
    pub browser: &'static str,
}

/// Classify device and browser family by substring matching on the raw
/// user-agent string. Chrome is checked before Safari because Chrome UAs
/// contain "safari".
pub fn classify_user_agent(user_agent: &str) -> (&'static str, &'static str) {
    let ua = user_agent.to_lowercase();

    let device = if ua.contains("mobile") {
        "Mobile"
    } else {
        "Desktop"
    };

    let browser = if ua.contains("chrome") {
        "Chrome"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "Other"
    };

    (device, browser)
}

pub async fn insert(pool: &PgPool, event: &NewEvent) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analytics_events
            (page_url, page_title, referrer, session_id, country, user_agent, device, browser)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&event.page_url)
    .bind(&event.page_title)
    .bind(&event.referrer)
    .bind(&event.session_id)
    .bind(&event.country)
    .bind(&event.user_agent)
    .bind(event.device)
    .bind(event.browser)
    .execute(pool)
    .await?;
    Ok(())
}

/// One aggregation bucket (page URL, day, referrer, device, ...).
#[derive(Debug, Serialize)]
pub struct BucketCount {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_views: i64,
    pub views_by_page: Vec<BucketCount>,
    pub views_by_date: Vec<BucketCount>,
    pub top_referrers: Vec<BucketCount>,
    pub device_breakdown: Vec<BucketCount>,
    pub browser_breakdown: Vec<BucketCount>,
    pub country_breakdown: Vec<BucketCount>,
}

fn buckets(rows: Vec<(String, i64)>) -> Vec<BucketCount> {
    rows.into_iter()
        .map(|(key, count)| BucketCount { key, count })
        .collect()
}

/// Grouped aggregation over the trailing `days` window.
pub async fn summarize(pool: &PgPool, days: i64) -> sqlx::Result<AnalyticsSummary> {
    let since = Utc::now() - Duration::days(days);

    let total_views: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM analytics_events WHERE visit_date >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

    let views_by_page = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT page_url, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1
        GROUP BY page_url ORDER BY 2 DESC LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let views_by_date = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT to_char(visit_date, 'YYYY-MM-DD') AS day, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1
        GROUP BY 1 ORDER BY 1
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let top_referrers = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT referrer, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1 AND referrer IS NOT NULL AND referrer <> ''
        GROUP BY referrer ORDER BY 2 DESC LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let device_breakdown = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT device, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1
        GROUP BY device ORDER BY 2 DESC
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let browser_breakdown = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT browser, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1
        GROUP BY browser ORDER BY 2 DESC
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let country_breakdown = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT country, COUNT(*) FROM analytics_events
        WHERE visit_date >= $1 AND country IS NOT NULL AND country <> ''
        GROUP BY country ORDER BY 2 DESC LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsSummary {
        total_views,
        views_by_page: buckets(views_by_page),
        views_by_date: buckets(views_by_date),
        top_referrers: buckets(top_referrers),
        device_breakdown: buckets(device_breakdown),
        browser_breakdown: buckets(browser_breakdown),
        country_breakdown: buckets(country_breakdown),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_desktop() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
        assert_eq!(classify_user_agent(ua), ("Desktop", "Chrome"));
    }

    #[test]
    fn test_safari_mobile() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                  (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
        assert_eq!(classify_user_agent(ua), ("Mobile", "Safari"));
    }

    #[test]
    fn test_firefox_desktop() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        assert_eq!(classify_user_agent(ua), ("Desktop", "Firefox"));
    }

    #[test]
    fn test_unknown_agent_is_other() {
        assert_eq!(classify_user_agent("curl/8.4.0"), ("Desktop", "Other"));
        assert_eq!(classify_user_agent(""), ("Desktop", "Other"));
    }
}
