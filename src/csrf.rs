//! Anti-forgery protection for the server-rendered forms.
//!
//! Signed double-submit: each browser gets a random nonce in an HttpOnly
//! cookie, and every `<form method="post">` the site renders is stamped
//! with a hidden field holding an HS256 signature over that nonce. A form
//! `POST` is only let through when the field verifies against the cookie
//! of the same request.

use axum::{
    Form,
    body::{Body, Bytes, to_bytes},
    extract::{FromRequest, Request, State},
    http::{self, HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    pages::PageError,
};

/// Name of the cookie carrying the per-browser nonce.
pub const CSRF_COOKIE: &str = "tansiqy_csrf";

/// Name of the hidden form field carrying the signed token.
pub const CSRF_FIELD: &str = "csrfToken";

const PURPOSE: &str = "csrf";

/// Largest form body buffered for verification.
const MAX_FORM_BODY: usize = 1024 * 1024;

/// Largest page buffered for stamping.
const MAX_PAGE_BODY: usize = 4 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct CsrfClaims {
    nonce: String,
    purpose: String,
}

#[derive(Debug, Default, Deserialize)]
struct SubmittedToken {
    #[serde(default, rename = "csrfToken")]
    csrf_token: String,
}

/// Signs the token a form must echo back for `nonce`.
pub fn sign_token(config: &AppConfig, nonce: &str) -> AppResult<String> {
    let claims = CsrfClaims {
        nonce: nonce.to_string(),
        purpose: PURPOSE.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign anti-forgery token: {e}")))
}

/// True when `token` was signed by this service for `nonce`.
pub fn verify_token(config: &AppConfig, token: &str, nonce: &str) -> bool {
    // The token lives as long as the cookie; there is no `exp` claim.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    match decode::<CsrfClaims>(token, &key, &validation) {
        Ok(data) => data.claims.purpose == PURPOSE && data.claims.nonce == nonce,
        Err(e) => {
            tracing::debug!(error = ?e, "rejected anti-forgery token");
            false
        }
    }
}

/// Reads the nonce cookie from the request headers.
pub fn request_nonce(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == CSRF_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|nonce| !nonce.is_empty())
}

/// Browser-session cookie holding the nonce.
pub fn nonce_cookie(config: &AppConfig, nonce: &str) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, nonce.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.env == Env::Production)
        .same_site(SameSite::Strict)
        .build()
}

/// stamp_forms
///
/// Inserts the hidden token field right after the opening tag of every
/// `POST` form in `html`. Returns `None` when the page has no such form.
pub fn stamp_forms(html: &str, token: &str) -> Option<String> {
    const OPENING: &str = "<form method=\"post\"";

    if !html.contains(OPENING) {
        return None;
    }
    let field = format!("<input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{token}\">");

    let mut out = String::with_capacity(html.len() + field.len() * 4);
    let mut rest = html;
    while let Some(start) = rest.find(OPENING) {
        let after_open = start + OPENING.len();
        let Some(close) = rest[after_open..].find('>') else {
            break;
        };
        let end = after_open + close + 1;
        out.push_str(&rest[..end]);
        out.push_str(&field);
        rest = &rest[end..];
    }
    out.push_str(rest);
    Some(out)
}

async fn submitted_token(bytes: Bytes) -> Option<String> {
    let request = http::Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(bytes))
        .ok()?;
    let Form(submitted) = Form::<SubmittedToken>::from_request(request, &()).await.ok()?;
    Some(submitted.csrf_token).filter(|token| !token.is_empty())
}

fn forged() -> Response {
    PageError(AppError::Validation(
        "The form has expired or was not sent by this site. Reload the page and try again.".into(),
    ))
    .into_response()
}

/// protect
///
/// Middleware for the page router. Verifies the token of every `POST`,
/// then stamps the HTML on the way out and hands a nonce cookie to
/// browsers that do not have one yet.
pub async fn protect(State(config): State<AppConfig>, request: Request, next: Next) -> Response {
    let existing = request_nonce(request.headers());

    let request = if request.method() == Method::POST {
        let (parts, body) = request.into_parts();
        let Ok(bytes) = to_bytes(body, MAX_FORM_BODY).await else {
            return forged();
        };
        let verified = match (&existing, submitted_token(bytes.clone()).await) {
            (Some(nonce), Some(token)) => verify_token(&config, &token, nonce),
            _ => false,
        };
        if !verified {
            tracing::warn!(path = %parts.uri.path(), "form post without a valid anti-forgery token");
            return forged();
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    let response = next.run(request).await;
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let nonce = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let token = match sign_token(&config, &nonce) {
        Ok(token) => token,
        Err(e) => return PageError(e).into_response(),
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_PAGE_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer page for anti-forgery stamping");
            return PageError(AppError::Internal(e.to_string())).into_response();
        }
    };
    let stamped = std::str::from_utf8(&bytes)
        .ok()
        .and_then(|html| stamp_forms(html, &token));
    let Some(html) = stamped else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    if existing.is_none() {
        if let Ok(value) = HeaderValue::from_str(&nonce_cookie(&config, &nonce).to_string()) {
            parts.headers.append(header::SET_COOKIE, value);
        }
    }
    Response::from_parts(parts, Body::from(html))
}
