pub mod submit;

use axum::Router;
use axum::http::Uri;
use axum::routing::post;

use crate::error::AppError;
use crate::state::SharedState;

pub fn submit_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/submit",
            post(submit::submit)
                .options(submit::preflight)
                .fallback(submit::method_not_allowed),
        )
        .route(
            "/submitAnyway",
            post(submit::submit_anyway)
                .options(submit::preflight)
                .fallback(submit::method_not_allowed),
        )
}

pub async fn not_found(uri: Uri) -> AppError {
    tracing::info!("Path not found: {}", uri.path());
    AppError::NotFound
}
