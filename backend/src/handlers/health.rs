//! Health check handler

/// Health check endpoint for the API router
pub async fn health_check() -> &'static str {
    "OK"
}
