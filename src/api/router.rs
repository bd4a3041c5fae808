use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics));

    // Ledger API: requires Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Users
        .route("/api/users", get(handlers::users::list).post(handlers::users::create))
        .route("/api/users/:id", get(handlers::users::detail))
        // Markets
        .route("/api/markets", get(handlers::markets::list).post(handlers::markets::create))
        .route("/api/markets/:id", get(handlers::markets::detail))
        .route("/api/markets/:id/lock", post(handlers::markets::lock))
        .route("/api/markets/:id/settle", post(handlers::markets::settle))
        // Bets
        .route("/api/bets", get(handlers::bets::list).post(handlers::bets::create))
        .route("/api/bets/:id", get(handlers::bets::detail))
        // Event stream
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
