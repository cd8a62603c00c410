//! HTTP route handlers for the evaluation server.

pub mod evaluate;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
