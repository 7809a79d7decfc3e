use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::Response,
};

use super::{ValidJson, created};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{
        BranchRequest, BranchView, DepartmentRequest, DepartmentView, MessageResponse,
        NameSearchParams, UniversityRequest, UniversitySearchParams, UniversityType,
        UniversityTypeView, UniversityView,
    },
};

fn invalid_type(code: i32) -> AppError {
    let valid = UniversityType::ALL
        .iter()
        .map(|t| format!("{}={}", t.code(), t.name()))
        .collect::<Vec<_>>()
        .join(", ");
    AppError::Validation(format!(
        "Invalid university type {code}. Valid types: {valid}"
    ))
}

fn body_id(id: Option<i32>, what: &str) -> AppResult<i32> {
    id.ok_or_else(|| AppError::Validation(format!("{what} ID is required")))
}

// --- Public Reads ---

/// get_university_types
///
/// [Public Route] Every university type with its Arabic name and the number
/// of universities carrying it.
#[utoipa::path(
    get,
    path = "/api/universities/types",
    tag = "universities",
    responses((status = 200, description = "Type breakdown", body = [UniversityTypeView]))
)]
pub async fn get_university_types(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UniversityTypeView>>> {
    Ok(Json(state.universities.university_types().await?))
}

/// get_universities_by_type
///
/// [Public Route] Summaries of the universities of one type. An unknown type
/// code is a 400, not an empty list.
#[utoipa::path(
    get,
    path = "/api/universities/type/{type}",
    tag = "universities",
    params(("type" = i32, Path, description = "University type code (1-6)")),
    responses(
        (status = 200, description = "Universities of the type", body = [UniversityView]),
        (status = 400, description = "Unknown type", body = crate::error::ErrorBody)
    )
)]
pub async fn get_universities_by_type(
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> AppResult<Json<Vec<UniversityView>>> {
    let university_type = UniversityType::from_code(code).ok_or_else(|| invalid_type(code))?;
    Ok(Json(
        state.universities.universities_by_type(university_type).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/universities/{id}",
    tag = "universities",
    params(("id" = i32, Path, description = "University ID")),
    responses(
        (status = 200, description = "University with colleges and branches", body = UniversityView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_university(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UniversityView>> {
    Ok(Json(state.universities.university(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/universities/search/name",
    tag = "universities",
    params(NameSearchParams),
    responses((status = 200, description = "Universities whose name matches", body = [UniversityView]))
)]
pub async fn search_universities_by_name(
    State(state): State<AppState>,
    Query(params): Query<NameSearchParams>,
) -> AppResult<Json<Vec<UniversityView>>> {
    let term = params.search_term.unwrap_or_default();
    Ok(Json(state.universities.search_by_name(&term).await?))
}

/// search_universities
///
/// [Public Route] Multi-criteria search. Filters are AND-ed; absent or blank
/// filters and unknown enum codes are ignored.
#[utoipa::path(
    get,
    path = "/api/universities/search",
    tag = "universities",
    params(UniversitySearchParams),
    responses(
        (status = 200, description = "Matching universities with matching colleges", body = [UniversityView]),
        (status = 400, description = "Malformed numeric filter", body = crate::error::ErrorBody)
    )
)]
pub async fn search_universities(
    State(state): State<AppState>,
    params: Result<Query<UniversitySearchParams>, QueryRejection>,
) -> AppResult<Json<Vec<UniversityView>>> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(Json(state.universities.search(&params.to_filter()).await?))
}

#[utoipa::path(
    get,
    path = "/api/universities/{id}/colleges",
    tag = "universities",
    params(("id" = i32, Path, description = "University ID")),
    responses(
        (status = 200, description = "Colleges with departments", body = [crate::models::CollegeView]),
        (status = 404, description = "University not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_university_colleges(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<crate::models::CollegeView>>> {
    Ok(Json(state.universities.colleges_of(id).await?))
}

// --- Admin: Universities ---

/// create_university
///
/// [Admin Route] Creates a university and, optionally, its branches.
#[utoipa::path(
    post,
    path = "/api/universities",
    tag = "universities",
    request_body = UniversityRequest,
    responses(
        (status = 201, description = "Created", body = UniversityView),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    ),
    security(("bearer" = []))
)]
pub async fn create_university(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UniversityRequest>,
) -> AppResult<Response> {
    let view = state.universities.create_university(&request).await?;
    tracing::debug!(admin_id = admin.id, id = view.id, "create_university");
    Ok(created(format!("/api/universities/{}", view.id), view))
}

/// update_university
///
/// [Admin Route] Full update; the target is named by the body's `id`.
#[utoipa::path(
    put,
    path = "/api/universities",
    tag = "universities",
    request_body = UniversityRequest,
    responses(
        (status = 200, description = "Updated", body = UniversityView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_university(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UniversityRequest>,
) -> AppResult<Json<UniversityView>> {
    let id = body_id(request.id, "University")?;
    Ok(Json(state.universities.update_university(id, &request).await?))
}

/// patch_university
///
/// [Admin Route] Same as `PUT`, with the route id taking precedence over any
/// id in the body.
#[utoipa::path(
    patch,
    path = "/api/universities/{id}",
    tag = "universities",
    params(("id" = i32, Path, description = "University ID")),
    request_body = UniversityRequest,
    responses(
        (status = 200, description = "Updated", body = UniversityView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn patch_university(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidJson(request): ValidJson<UniversityRequest>,
) -> AppResult<Json<UniversityView>> {
    Ok(Json(state.universities.update_university(id, &request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/universities/{id}",
    tag = "universities",
    params(("id" = i32, Path, description = "University ID")),
    responses(
        (status = 200, description = "Deleted with its colleges and branches", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_university(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    if state.universities.delete_university(id).await? {
        Ok(Json(MessageResponse::new("University deleted successfully")))
    } else {
        Err(AppError::not_found("University", id))
    }
}

// --- Admin: Departments ---

#[utoipa::path(
    post,
    path = "/api/universities/departments",
    tag = "departments",
    request_body = DepartmentRequest,
    responses(
        (status = 201, description = "Created", body = DepartmentView),
        (status = 404, description = "College not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_department(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<DepartmentRequest>,
) -> AppResult<Response> {
    let view = state.universities.create_department(&request).await?;
    Ok(created(format!("/api/colleges/{}", view.college_id), view))
}

#[utoipa::path(
    put,
    path = "/api/universities/departments",
    tag = "departments",
    request_body = DepartmentRequest,
    responses(
        (status = 200, description = "Updated", body = DepartmentView),
        (status = 404, description = "Department or college not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_department(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<DepartmentRequest>,
) -> AppResult<Json<DepartmentView>> {
    let id = body_id(request.id, "Department")?;
    Ok(Json(state.universities.update_department(id, &request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/universities/departments/{id}",
    tag = "departments",
    params(("id" = i32, Path, description = "Department ID")),
    request_body = DepartmentRequest,
    responses(
        (status = 200, description = "Updated", body = DepartmentView),
        (status = 404, description = "Department or college not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn patch_department(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidJson(request): ValidJson<DepartmentRequest>,
) -> AppResult<Json<DepartmentView>> {
    Ok(Json(state.universities.update_department(id, &request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/universities/departments/{id}",
    tag = "departments",
    params(("id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_department(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    if state.universities.delete_department(id).await? {
        Ok(Json(MessageResponse::new("Department deleted successfully")))
    } else {
        Err(AppError::not_found("Department", id))
    }
}

// --- Admin: Branches ---

#[utoipa::path(
    post,
    path = "/api/universities/{id}/branches",
    tag = "branches",
    params(("id" = i32, Path, description = "University ID")),
    request_body = BranchRequest,
    responses(
        (status = 201, description = "Created", body = BranchView),
        (status = 404, description = "University not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_branch(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
    ValidJson(request): ValidJson<BranchRequest>,
) -> AppResult<Response> {
    let view = state
        .universities
        .create_branch(university_id, &request)
        .await?;
    Ok(created(format!("/api/universities/{university_id}"), view))
}

#[utoipa::path(
    put,
    path = "/api/universities/{id}/branches",
    tag = "branches",
    params(("id" = i32, Path, description = "University ID")),
    request_body = BranchRequest,
    responses(
        (status = 200, description = "Updated", body = BranchView),
        (status = 400, description = "Branch belongs to another university", body = crate::error::ErrorBody),
        (status = 404, description = "University or branch not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_branch(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
    ValidJson(request): ValidJson<BranchRequest>,
) -> AppResult<Json<BranchView>> {
    let branch_id = body_id(request.id, "Branch")?;
    Ok(Json(
        state
            .universities
            .update_branch(university_id, branch_id, &request)
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/universities/{id}/branches/{branch_id}",
    tag = "branches",
    params(
        ("id" = i32, Path, description = "University ID"),
        ("branch_id" = i32, Path, description = "Branch ID")
    ),
    request_body = BranchRequest,
    responses(
        (status = 200, description = "Updated", body = BranchView),
        (status = 400, description = "Branch belongs to another university", body = crate::error::ErrorBody),
        (status = 404, description = "University or branch not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn patch_branch(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((university_id, branch_id)): Path<(i32, i32)>,
    ValidJson(request): ValidJson<BranchRequest>,
) -> AppResult<Json<BranchView>> {
    Ok(Json(
        state
            .universities
            .update_branch(university_id, branch_id, &request)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/universities/branches/{id}",
    tag = "branches",
    params(("id" = i32, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_branch(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    if state.universities.delete_branch(id).await? {
        Ok(Json(MessageResponse::new("Branch deleted successfully")))
    } else {
        Err(AppError::not_found("Branch", id))
    }
}
