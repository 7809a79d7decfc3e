//! Server-rendered front-end handlers. Pages share the services with the
//! JSON API but authenticate through the session cookie and answer with
//! HTML and redirects.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, Uri, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;

use crate::{
    auth::{AuthUser, resolve_token, session_token},
    config::AppConfig,
    error::AppError,
    repository::Repositories,
    views::{self, encode_component},
};

pub mod account;
pub mod admin;
pub mod catalog;
pub mod forms;
pub mod users;

pub const LOGIN_PATH: &str = "/account/login";
pub const ACCESS_DENIED_PATH: &str = "/account/access-denied";

/// PageError
///
/// An [`AppError`] rendered as an HTML error page with the same status
/// code the JSON API would use.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status();
        // Server-side detail stays in the logs.
        let message = if status.is_server_error() {
            "حدث خطأ أثناء معالجة طلبك. يرجى المحاولة لاحقاً.".to_string()
        } else {
            self.0.to_string()
        };
        (status, views::error_page(status, &message, None)).into_response()
    }
}

pub type PageResult<T = Response> = Result<T, PageError>;

/// Only same-site absolute paths are honored as post-login targets.
///
/// Browsers drop tabs and newlines from `Location` and read `\` as `/`,
/// so any of those would let a path like `/\t/host` reach another origin.
pub fn is_local_url(url: &str) -> bool {
    if !url.starts_with('/') || url.starts_with("//") {
        return false;
    }
    if url
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || c == '\\')
    {
        return false;
    }
    match url.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}

/// Redirect with an extra `Set-Cookie` header.
pub(crate) fn redirect_with_cookie(target: &str, cookie: Cookie<'static>) -> Response {
    let mut response = Redirect::to(target).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

// --- Session Extractors ---

async fn session_user<S>(parts: &Parts, state: &S) -> Option<AuthUser>
where
    Repositories: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let token = session_token(&parts.headers)?;
    let repos = Repositories::from_ref(state);
    let config = AppConfig::from_ref(state);
    match resolve_token(&repos, &config, &token).await {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring invalid session cookie");
            None
        }
    }
}

/// CurrentSession
///
/// The signed-in user, if any. An invalid or expired cookie reads as
/// anonymous rather than failing the page.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<AuthUser>);

impl CurrentSession {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    Repositories: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(session_user(parts, state).await))
    }
}

/// AdminSession
///
/// A signed-in Admin. Anonymous visitors are redirected to the login page
/// with a `returnUrl` back to the requested page; other users are sent to
/// the access-denied page.
#[derive(Debug, Clone)]
pub struct AdminSession(pub AuthUser);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    Repositories: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Some(user) if user.is_admin() => Ok(AdminSession(user)),
            Some(user) => {
                tracing::warn!(user_id = user.id, path = %parts.uri.path(), "admin page denied");
                Err(Redirect::to(ACCESS_DENIED_PATH).into_response())
            }
            None => {
                let return_url = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let target = format!("{LOGIN_PATH}?returnUrl={}", encode_component(return_url));
                Err(Redirect::to(&target).into_response())
            }
        }
    }
}
