/**
 * Routes Module
 * API route handlers
 */
pub mod activity;
pub mod analytics;
pub mod auth;
pub mod blogs;
pub mod health;
pub mod notifications;
pub mod pages;
pub mod public;
pub mod users;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Standard success envelope: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct DataBody<T: Serialize> {
    pub data: T,
}

/// Bare success response (delete, mark-read, tracking).
#[derive(Debug, Serialize)]
pub struct SuccessBody {
    pub success: bool,
}

lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens.
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Simple email shape check; no attempt at full RFC validation.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("about-us"));
        assert!(is_valid_slug("post-2024"));
        assert!(!is_valid_slug("About-Us"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("two--hyphens"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("spaces in@x.com"));
    }
}
