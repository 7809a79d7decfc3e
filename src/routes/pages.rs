use crate::{
    AppState,
    cache::{ResponseCache, cached},
    config::AppConfig,
    csrf,
    pages::{account, admin, catalog, users},
};
use axum::{
    Router,
    middleware,
    routing::{get, post},
};

/// Pages Router Module
///
/// The server-rendered site. Public pages resolve the optional session;
/// admin pages take the `AdminSession` extractor, which redirects rather
/// than failing. The home page and the by-type listing are cached for
/// anonymous visitors only. Every form post passes the anti-forgery check.
pub fn page_routes(cache: &ResponseCache, config: &AppConfig) -> Router<AppState> {
    Router::new()
        // --- Catalog ---
        .route("/", cached(get(catalog::home), cache, 300))
        .route(
            "/universities",
            cached(get(catalog::universities_by_type), cache, 180),
        )
        .route("/universities/select-type", get(catalog::select_type))
        .route("/universities/search", get(catalog::search))
        .route("/universities/{id}", get(catalog::university_details))
        .route("/universities/{id}/colleges", get(catalog::university_colleges))
        .route("/colleges/{id}", get(catalog::college_details))
        .route("/colleges/{id}/departments", get(catalog::college_departments))
        // --- Catalog Administration ---
        .route(
            "/universities/create",
            get(admin::create_university_form).post(admin::create_university),
        )
        .route(
            "/universities/{id}/edit",
            get(admin::edit_university_form).post(admin::edit_university),
        )
        .route("/universities/{id}/delete", post(admin::delete_university))
        .route(
            "/universities/{id}/colleges/create",
            get(admin::create_college_form).post(admin::create_college),
        )
        .route(
            "/colleges/{id}/edit",
            get(admin::edit_college_form).post(admin::edit_college),
        )
        // --- Account ---
        .route(
            "/account/login",
            get(account::login_form).post(account::login),
        )
        .route("/account/logout", post(account::logout))
        .route("/account/access-denied", get(account::access_denied))
        // --- User Management ---
        .route("/users", get(users::list))
        .route("/users/create", get(users::create_form).post(users::create))
        .route("/users/{id}/edit", get(users::edit_form).post(users::edit))
        .route("/users/{id}/delete", post(users::delete))
        .layer(middleware::from_fn_with_state(config.clone(), csrf::protect))
}
