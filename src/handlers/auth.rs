use axum::{Json, extract::State};

use super::ValidJson;
use crate::{
    AppState,
    error::AppResult,
    models::{LoginRequest, LoginResponse},
};

/// login
///
/// [Public Route] Exchanges email and password for a bearer token. Every
/// credential failure is the same 401 so accounts cannot be probed.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Malformed credentials", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(state.auth.login(&request.email, &request.password).await?))
}
