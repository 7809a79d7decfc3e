use crate::{AppState, handlers::{colleges, news, universities}};
use axum::{
    Router,
    routing::{delete, patch, post},
};

/// Admin Router Module
///
/// Catalog and news mutations. Access control lives in the `AdminUser`
/// extractor every handler takes: anonymous callers get 401, authenticated
/// non-admins 403. None of these routes pass through the response cache.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST/PUT /api/universities
        .route(
            "/api/universities",
            post(universities::create_university).put(universities::update_university),
        )
        // PATCH/DELETE /api/universities/{id}
        .route(
            "/api/universities/{id}",
            patch(universities::patch_university).delete(universities::delete_university),
        )
        // --- Colleges ---
        .route(
            "/api/universities/colleges",
            post(colleges::create_college).put(colleges::update_college),
        )
        .route(
            "/api/universities/colleges/{id}",
            patch(colleges::patch_college).delete(colleges::delete_college),
        )
        // --- Departments ---
        .route(
            "/api/universities/departments",
            post(universities::create_department).put(universities::update_department),
        )
        .route(
            "/api/universities/departments/{id}",
            patch(universities::patch_department).delete(universities::delete_department),
        )
        // --- Branches ---
        // Branches are addressed through their university, except for DELETE.
        .route(
            "/api/universities/{id}/branches",
            post(universities::create_branch).put(universities::update_branch),
        )
        .route(
            "/api/universities/{id}/branches/{branch_id}",
            patch(universities::patch_branch),
        )
        .route(
            "/api/universities/branches/{id}",
            delete(universities::delete_branch),
        )
        // --- News ---
        .route("/api/news", post(news::create_news).put(news::update_news))
        .route(
            "/api/news/{id}",
            patch(news::patch_news).delete(news::delete_news),
        )
}
