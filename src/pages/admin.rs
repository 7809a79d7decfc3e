use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};

use super::{
    AdminSession, PageError, PageResult,
    forms::{CollegeForm, UniversityForm},
};
use crate::{AppState, error::AppError, views::forms};

/// Splits a failed submit into errors shown on the re-rendered form and
/// errors that deserve the error page.
pub(crate) fn rejected_form(err: AppError) -> Result<(StatusCode, String), PageError> {
    let status = err.status();
    match err {
        AppError::Validation(message) | AppError::Conflict(message) => Ok((status, message)),
        other => Err(PageError(other)),
    }
}

// --- Universities ---

pub async fn create_university_form(AdminSession(admin): AdminSession) -> Html<String> {
    forms::university_form(
        "إضافة جامعة",
        "/universities/create",
        &UniversityForm::default(),
        None,
        Some(&admin),
    )
}

pub async fn create_university(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<UniversityForm>,
) -> PageResult {
    let created = match form.to_request(None) {
        Ok(request) => state.universities.create_university(&request).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(view) => Ok(Redirect::to(&format!("/universities/{}", view.id)).into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = forms::university_form(
                "إضافة جامعة",
                "/universities/create",
                &form,
                Some(&message),
                Some(&admin),
            );
            Ok((status, page).into_response())
        }
    }
}

pub async fn edit_university_form(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let university = state.universities.university(id).await?;
    Ok(forms::university_form(
        "تعديل الجامعة",
        &format!("/universities/{id}/edit"),
        &UniversityForm::from_view(&university),
        None,
        Some(&admin),
    ))
}

pub async fn edit_university(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<UniversityForm>,
) -> PageResult {
    let updated = match form.to_request(Some(id)) {
        Ok(request) => state.universities.update_university(id, &request).await,
        Err(e) => Err(e),
    };
    match updated {
        Ok(_) => Ok(Redirect::to(&format!("/universities/{id}")).into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = forms::university_form(
                "تعديل الجامعة",
                &format!("/universities/{id}/edit"),
                &form,
                Some(&message),
                Some(&admin),
            );
            Ok((status, page).into_response())
        }
    }
}

/// Deletes the university with its colleges, departments and branches.
pub async fn delete_university(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult {
    if !state.universities.delete_university(id).await? {
        return Err(AppError::not_found("University", id).into());
    }
    tracing::info!(admin_id = admin.id, id, "university deleted from admin page");
    Ok(Redirect::to("/").into_response())
}

// --- Colleges ---

pub async fn create_college_form(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
) -> PageResult<Html<String>> {
    let university = state.universities.university(university_id).await?;
    Ok(forms::college_form(
        &format!("إضافة كلية إلى {}", university.name_ar),
        &format!("/universities/{university_id}/colleges/create"),
        &CollegeForm::for_university(university_id),
        None,
        Some(&admin),
    ))
}

pub async fn create_college(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
    Form(mut form): Form<CollegeForm>,
) -> PageResult {
    // The route names the university; a tampered hidden field is ignored.
    form.university_id = university_id.to_string();
    let created = match form.to_request(None) {
        Ok(request) => state.universities.create_college(&request).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(view) => Ok(Redirect::to(&format!("/colleges/{}", view.id)).into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = forms::college_form(
                "إضافة كلية",
                &format!("/universities/{university_id}/colleges/create"),
                &form,
                Some(&message),
                Some(&admin),
            );
            Ok((status, page).into_response())
        }
    }
}

pub async fn edit_college_form(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let college = state.universities.college(id).await?;
    Ok(forms::college_form(
        "تعديل الكلية",
        &format!("/colleges/{id}/edit"),
        &CollegeForm::from_view(&college),
        None,
        Some(&admin),
    ))
}

pub async fn edit_college(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<CollegeForm>,
) -> PageResult {
    let updated = match form.to_request(Some(id)) {
        Ok(request) => state.universities.update_college(id, &request).await,
        Err(e) => Err(e),
    };
    match updated {
        Ok(_) => Ok(Redirect::to(&format!("/colleges/{id}")).into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = forms::college_form(
                "تعديل الكلية",
                &format!("/colleges/{id}/edit"),
                &form,
                Some(&message),
                Some(&admin),
            );
            Ok((status, page).into_response())
        }
    }
}
