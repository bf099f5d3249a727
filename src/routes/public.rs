use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
///
/// Security Mandate:
/// The image list handler must enforce `approved = true` at the Repository
/// level. This prevents anonymous viewing of uploads still pending moderation.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /images/ lists approved images, newest first.
        // POST /images/ accepts a multipart upload (`image` file + optional `title`),
        // enforcing the one-image-per-IP rule and full content validation.
        .route(
            "/images/",
            get(handlers::list_images).post(handlers::upload_image),
        )
        // POST /order-forms/
        // Validates and persists a contact/order submission.
        .route("/order-forms/", post(handlers::create_order_form))
}
