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
    models::{MessageResponse, NewsRequest, NewsView},
};

#[utoipa::path(
    get,
    path = "/api/news",
    tag = "news",
    responses((status = 200, description = "All news, newest first", body = [NewsView]))
)]
pub async fn get_news(State(state): State<AppState>) -> AppResult<Json<Vec<NewsView>>> {
    Ok(Json(state.news.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/news/{id}",
    tag = "news",
    params(("id" = i32, Path, description = "News ID")),
    responses(
        (status = 200, description = "News item", body = NewsView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_news_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<NewsView>> {
    Ok(Json(state.news.get(id).await?))
}

/// create_news
///
/// [Admin Route] Publishes an item. A missing `date` means now.
#[utoipa::path(
    post,
    path = "/api/news",
    tag = "news",
    request_body = NewsRequest,
    responses(
        (status = 201, description = "Created", body = NewsView),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewsRequest>,
) -> AppResult<Response> {
    let view = state.news.create(&request).await?;
    Ok(created(format!("/api/news/{}", view.id), view))
}

#[utoipa::path(
    put,
    path = "/api/news",
    tag = "news",
    request_body = NewsRequest,
    responses(
        (status = 200, description = "Updated", body = NewsView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewsRequest>,
) -> AppResult<Json<NewsView>> {
    let id = request
        .id
        .ok_or_else(|| AppError::Validation("News ID is required".into()))?;
    Ok(Json(state.news.update(id, &request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/news/{id}",
    tag = "news",
    params(("id" = i32, Path, description = "News ID")),
    request_body = NewsRequest,
    responses(
        (status = 200, description = "Updated", body = NewsView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn patch_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidJson(request): ValidJson<NewsRequest>,
) -> AppResult<Json<NewsView>> {
    Ok(Json(state.news.update(id, &request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    tag = "news",
    params(("id" = i32, Path, description = "News ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    if state.news.delete(id).await? {
        Ok(Json(MessageResponse::new("News deleted successfully")))
    } else {
        Err(AppError::not_found("News", id))
    }
}
