use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application layers, from storage up to HTTP.
pub mod auth;
pub mod cache;
pub mod config;
pub mod csrf;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

// HTTP surfaces: the JSON API and the server-rendered site.
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod views;

use routes::{admin, pages as page_router, public};

// --- Public Re-exports ---

pub use cache::ResponseCache;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, Repositories};
use services::{AuthService, NewsService, UniversityService, UserService};

/// ApiDoc
///
/// Auto-generated OpenAPI document for the JSON API, served at
/// `/api-docs/openapi.json` and browsable through `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::universities::get_university_types,
        handlers::universities::get_universities_by_type,
        handlers::universities::get_university,
        handlers::universities::search_universities_by_name,
        handlers::universities::search_universities,
        handlers::universities::get_university_colleges,
        handlers::universities::create_university,
        handlers::universities::update_university,
        handlers::universities::patch_university,
        handlers::universities::delete_university,
        handlers::universities::create_department,
        handlers::universities::update_department,
        handlers::universities::patch_department,
        handlers::universities::delete_department,
        handlers::universities::create_branch,
        handlers::universities::update_branch,
        handlers::universities::patch_branch,
        handlers::universities::delete_branch,
        handlers::colleges::get_college,
        handlers::colleges::create_college,
        handlers::colleges::update_college,
        handlers::colleges::patch_college,
        handlers::colleges::delete_college,
        handlers::news::get_news,
        handlers::news::get_news_item,
        handlers::news::create_news,
        handlers::news::update_news,
        handlers::news::patch_news,
        handlers::news::delete_news,
    ),
    components(
        schemas(
            models::UniversityView, models::UniversityBasicView, models::CollegeView,
            models::DepartmentView, models::BranchView, models::UniversityTypeView,
            models::NewsView, models::LoginResponse, models::MessageResponse,
            models::UniversityRequest, models::CollegeRequest, models::DepartmentRequest,
            models::BranchRequest, models::NewsRequest, models::LoginRequest,
            error::ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "universities", description = "Universities, search and type breakdown"),
        (name = "colleges", description = "Colleges and their fee schemas"),
        (name = "departments", description = "Departments of a college"),
        (name = "branches", description = "Branch campuses of a university"),
        (name = "news", description = "Announcements"),
        (name = "auth", description = "Bearer token issuance")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by the admin endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// AppState
///
/// The single, cloneable container shared by every request: repositories,
/// configuration, the response cache and the services built on top of them.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: trait objects over Postgres (or the in-memory store in tests).
    pub repos: Repositories,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    pub cache: ResponseCache,
    pub universities: UniversityService,
    pub news: NewsService,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    pub fn new(repos: Repositories, config: AppConfig) -> Self {
        Self {
            universities: UniversityService::new(&repos),
            news: NewsService::new(&repos),
            auth: AuthService::new(&repos, config.clone()),
            users: UserService::new(&repos),
            cache: ResponseCache::default(),
            repos,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets the auth extractors pull only what they need from the shared state.

impl FromRef<AppState> for Repositories {
    fn from_ref(app_state: &AppState) -> Repositories {
        app_state.repos.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the JSON API, the front-end and the docs, then applies the
/// observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public API: anonymous reads, behind the response cache.
        .merge(public::public_routes(&state.cache))
        // Admin API: guarded per handler by the `AdminUser` extractor.
        .merge(admin::admin_routes())
        // Front-end pages.
        .merge(page_router::page_routes(&state.cache, &state.config))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request ID, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
