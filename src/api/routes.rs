//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for unknown routes
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found", "kind": "not_found" })),
    )
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser wallets
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Accounts
        .route(
            "/api/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/api/accounts/{id}", get(handlers::get_account))
        .route("/api/accounts/{id}/refresh", post(handlers::refresh_account))
        // Transactions
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/api/transactions/{id}", get(handlers::get_transaction))
        .route("/api/transactions/{id}/sign-doc", get(handlers::get_sign_doc))
        .route(
            "/api/transactions/{id}/signatures",
            post(handlers::submit_signature),
        )
        .route(
            "/api/transactions/{id}/broadcast",
            post(handlers::broadcast_transaction),
        )
        // Proposals
        .route(
            "/api/proposals",
            get(handlers::list_proposals).post(handlers::create_proposal),
        )
        .route("/api/proposals/{id}", get(handlers::get_proposal))
        .route("/api/proposals/{id}/votes", post(handlers::vote_proposal))
        .route("/api/proposals/{id}/execute", post(handlers::execute_proposal))
        // Maintenance
        .route("/api/maintenance/cleanup", post(handlers::run_cleanup))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors)
}
