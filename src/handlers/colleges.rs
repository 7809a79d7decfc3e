use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

use super::{ValidJson, created};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{CollegeRequest, CollegeView, MessageResponse},
};

/// get_college
///
/// [Public Route] A college with its departments and a back-reference to
/// its university.
#[utoipa::path(
    get,
    path = "/api/colleges/{id}",
    tag = "colleges",
    params(("id" = i32, Path, description = "College ID")),
    responses(
        (status = 200, description = "College details", body = CollegeView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_college(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CollegeView>> {
    Ok(Json(state.universities.college(id).await?))
}

/// create_college
///
/// [Admin Route] Creates a college under an existing university, with any
/// nested departments. A missing university is a 404.
#[utoipa::path(
    post,
    path = "/api/universities/colleges",
    tag = "colleges",
    request_body = CollegeRequest,
    responses(
        (status = 201, description = "Created", body = CollegeView),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorBody),
        (status = 404, description = "University not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_college(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CollegeRequest>,
) -> AppResult<Response> {
    let view = state.universities.create_college(&request).await?;
    Ok(created(format!("/api/colleges/{}", view.id), view))
}

#[utoipa::path(
    put,
    path = "/api/universities/colleges",
    tag = "colleges",
    request_body = CollegeRequest,
    responses(
        (status = 200, description = "Updated", body = CollegeView),
        (status = 404, description = "College or university not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_college(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CollegeRequest>,
) -> AppResult<Json<CollegeView>> {
    let id = request
        .id
        .ok_or_else(|| AppError::Validation("College ID is required".into()))?;
    Ok(Json(state.universities.update_college(id, &request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/universities/colleges/{id}",
    tag = "colleges",
    params(("id" = i32, Path, description = "College ID")),
    request_body = CollegeRequest,
    responses(
        (status = 200, description = "Updated", body = CollegeView),
        (status = 404, description = "College or university not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn patch_college(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidJson(request): ValidJson<CollegeRequest>,
) -> AppResult<Json<CollegeView>> {
    Ok(Json(state.universities.update_college(id, &request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/universities/colleges/{id}",
    tag = "colleges",
    params(("id" = i32, Path, description = "College ID")),
    responses(
        (status = 200, description = "Deleted with its departments", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_college(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    if state.universities.delete_college(id).await? {
        Ok(Json(MessageResponse::new("College deleted successfully")))
    } else {
        Err(AppError::not_found("College", id))
    }
}
