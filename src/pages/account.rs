use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::{CurrentSession, PageResult, forms::LoginForm, is_local_url, redirect_with_cookie};
use crate::{
    AppState,
    auth::{expired_session_cookie, session_cookie},
    error::AppError,
    views::account,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReturnQuery {
    pub return_url: String,
}

pub async fn login_form(Query(query): Query<ReturnQuery>) -> Html<String> {
    account::login("", &query.return_url, None)
}

/// login
///
/// Checks the credentials, sets the session cookie and returns to
/// `returnUrl` when it is a local path, otherwise to the home page.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> PageResult {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(rejected(&form, "البريد الإلكتروني وكلمة المرور مطلوبان"));
    }

    match state.auth.session_login(&form.email, &form.password).await {
        Ok((token, _user)) => {
            let target = if is_local_url(&form.return_url) {
                form.return_url.as_str()
            } else {
                "/"
            };
            Ok(redirect_with_cookie(target, session_cookie(&state.config, &token)))
        }
        Err(AppError::Unauthorized(_)) => Ok(rejected(
            &form,
            "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        )),
        Err(e) => Err(e.into()),
    }
}

fn rejected(form: &LoginForm, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        account::login(&form.email, &form.return_url, Some(message)),
    )
        .into_response()
}

pub async fn logout(session: CurrentSession) -> Response {
    if let Some(user) = session.user() {
        tracing::info!(user_id = user.id, "user logged out");
    }
    redirect_with_cookie("/", expired_session_cookie())
}

pub async fn access_denied(session: CurrentSession) -> Html<String> {
    account::access_denied(session.user())
}
