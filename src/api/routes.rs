//! Route table and middleware stack

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::handlers;
use crate::middleware::{auth::AuthLayer, rate_limit::RateLimitLayer};
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = state.settings.clone();

    let api = Router::new()
        .route(
            "/api/generate",
            post(handlers::submit_generation).get(handlers::job_status),
        )
        .route(
            "/api/retouch",
            post(handlers::submit_retouch).get(handlers::job_status),
        )
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/api/jobs/status", get(handlers::job_status))
        .route("/api/images/:id/favorite", put(handlers::set_favorite))
        .route("/api/upload", post(handlers::upload))
        .route("/api/credits", get(handlers::credits))
        .route("/api/queue/stats", get(handlers::queue_stats))
        .route("/health", get(handlers::health))
        .nest_service("/images", ServeDir::new(&settings.storage.base_path))
        .with_state(state.clone());

    // Layers run outermost-last: auth attaches the identity the rate
    // limiter keys on.
    let mut router = api;
    if settings.rate_limit.enabled {
        router = router.layer(RateLimitLayer::new(
            settings.rate_limit.requests_per_second,
            settings.rate_limit.burst_size,
        ));
    }

    let auth = if settings.auth.enabled {
        AuthLayer::new(settings.auth.tokens.clone(), settings.auth.default_user.clone())
    } else {
        AuthLayer::single_user(settings.auth.default_user.clone())
    };

    router
        .layer(auth)
        .layer(TimeoutLayer::new(state.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
