use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use super::{CurrentSession, PageError, PageResult};
use crate::{
    AppState,
    error::AppError,
    models::{UniversitySearchParams, UniversityType},
    views::catalog,
};

/// How many news items the home page shows.
const HOME_NEWS_LIMIT: usize = 5;

/// home
///
/// Counts per university type and the latest news.
pub async fn home(
    session: CurrentSession,
    State(state): State<AppState>,
) -> PageResult<Html<String>> {
    let types = state.universities.university_types().await?;
    let mut news = state.news.list().await?;
    news.truncate(HOME_NEWS_LIMIT);
    Ok(catalog::home(&types, &news, session.user()))
}

pub async fn select_type(
    session: CurrentSession,
    State(state): State<AppState>,
) -> PageResult<Html<String>> {
    let types = state.universities.university_types().await?;
    Ok(catalog::select_type(&types, session.user()))
}

#[derive(Debug, Deserialize)]
pub struct TypeQuery {
    #[serde(default, rename = "type", deserialize_with = "crate::models::blank_as_none")]
    pub university_type: Option<i32>,
}

/// universities_by_type
///
/// `GET /universities?type=N`. Without a usable type the visitor is sent to
/// the type picker instead of an error page.
pub async fn universities_by_type(
    session: CurrentSession,
    State(state): State<AppState>,
    query: Result<Query<TypeQuery>, QueryRejection>,
) -> PageResult {
    let Some(university_type) = query
        .ok()
        .and_then(|Query(q)| q.university_type)
        .and_then(UniversityType::from_code)
    else {
        return Ok(Redirect::to("/universities/select-type").into_response());
    };

    let universities = state
        .universities
        .universities_by_type(university_type)
        .await?;
    Ok(catalog::universities_by_type(university_type, &universities, session.user()).into_response())
}

pub async fn university_details(
    session: CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let university = state.universities.university(id).await?;
    Ok(catalog::university_details(&university, session.user()))
}

pub async fn university_colleges(
    session: CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let university = state.universities.university(id).await?;
    Ok(catalog::colleges(&university, session.user()))
}

pub async fn college_details(
    session: CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let college = state.universities.college(id).await?;
    Ok(catalog::college_details(&college, session.user()))
}

pub async fn college_departments(
    session: CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let college = state.universities.college(id).await?;
    Ok(catalog::departments(&college, session.user()))
}

/// search
///
/// Renders the search form; results appear once at least one filter is
/// present. Malformed numbers are reported on the error page.
pub async fn search(
    session: CurrentSession,
    State(state): State<AppState>,
    query: Result<Query<UniversitySearchParams>, QueryRejection>,
) -> PageResult<Html<String>> {
    let Query(params) = query.map_err(|e| PageError(AppError::Validation(e.body_text())))?;
    let filter = params.to_filter();
    let results = if filter.is_empty() {
        None
    } else {
        Some(state.universities.search(&filter).await?)
    };
    Ok(catalog::search(&params, results.as_deref(), session.user()))
}
