use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
};

use super::{AdminSession, PageResult, admin::rejected_form, forms::UserForm};
use crate::{AppState, error::AppError, views::users};

pub async fn list(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
) -> PageResult<Html<String>> {
    let accounts = state.users.list().await?;
    Ok(users::list(&accounts, &admin))
}

pub async fn create_form(AdminSession(admin): AdminSession) -> Html<String> {
    users::form(
        "إضافة مستخدم",
        "/users/create",
        &UserForm::new_account(),
        false,
        None,
        &admin,
    )
}

pub async fn create(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<UserForm>,
) -> PageResult {
    let created = match form.to_request() {
        Ok(request) => state.users.create(&request).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(_) => Ok(Redirect::to("/users").into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = users::form(
                "إضافة مستخدم",
                "/users/create",
                &form,
                false,
                Some(&message),
                &admin,
            );
            Ok((status, page).into_response())
        }
    }
}

pub async fn edit_form(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult<Html<String>> {
    let account = state.users.get(id).await?;
    Ok(users::form(
        "تعديل المستخدم",
        &format!("/users/{id}/edit"),
        &UserForm::from_view(&account),
        true,
        None,
        &admin,
    ))
}

pub async fn edit(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<UserForm>,
) -> PageResult {
    let updated = match form.to_request() {
        Ok(request) => state.users.update(id, &request).await,
        Err(e) => Err(e),
    };
    match updated {
        Ok(_) => Ok(Redirect::to("/users").into_response()),
        Err(e) => {
            let (status, message) = rejected_form(e)?;
            let page = users::form(
                "تعديل المستخدم",
                &format!("/users/{id}/edit"),
                &form,
                true,
                Some(&message),
                &admin,
            );
            Ok((status, page).into_response())
        }
    }
}

pub async fn delete(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> PageResult {
    if !state.users.delete(id).await? {
        return Err(AppError::not_found("User", id).into());
    }
    Ok(Redirect::to("/users").into_response())
}
