use crate::{AppState, cache::{ResponseCache, cached}, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous clients. Every catalog read is wrapped in the
/// response cache with its own TTL (seconds); only the login and health
/// endpoints bypass it.
pub fn public_routes(cache: &ResponseCache) -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        .route("/api/auth/login", post(handlers::auth::login))
        // --- Universities ---
        .route(
            "/api/universities/types",
            cached(get(handlers::universities::get_university_types), cache, 300),
        )
        .route(
            "/api/universities/type/{type}",
            cached(get(handlers::universities::get_universities_by_type), cache, 180),
        )
        .route(
            "/api/universities/search/name",
            cached(get(handlers::universities::search_universities_by_name), cache, 120),
        )
        .route(
            "/api/universities/search",
            cached(get(handlers::universities::search_universities), cache, 120),
        )
        .route(
            "/api/universities/{id}",
            cached(get(handlers::universities::get_university), cache, 300),
        )
        .route(
            "/api/universities/{id}/colleges",
            cached(get(handlers::universities::get_university_colleges), cache, 180),
        )
        // --- Colleges ---
        // Not cached: the detail view is assembled from three tables.
        .route("/api/colleges/{id}", get(handlers::colleges::get_college))
        // --- News ---
        .route("/api/news", cached(get(handlers::news::get_news), cache, 300))
        .route(
            "/api/news/{id}",
            cached(get(handlers::news::get_news_item), cache, 300),
        )
}
