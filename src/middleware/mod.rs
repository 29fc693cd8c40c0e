//! Tower middleware - caller identity and rate limiting

pub mod auth;
pub mod rate_limit;

/// Paths served without identity or rate limiting
pub(crate) fn is_public_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/images/")
}
