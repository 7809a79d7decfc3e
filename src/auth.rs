use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{User, UserRole},
    repository::Repositories,
};

/// Name of the HttpOnly cookie carrying the front-end session token.
pub const SESSION_COOKIE: &str = "tansiqy_session";

/// Bcrypt work factor.
pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Claims
///
/// Payload of every token this service issues. API bearer tokens and
/// front-end session tokens share the shape and differ only in lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's integer id, as a string.
    pub sub: String,
    pub email: String,
    /// English role name (`Admin` / `Student`).
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    /// Expiration Time (exp): validated with zero leeway.
    pub exp: i64,
}

/// issue_token
///
/// Signs an HS256 token for `user` that expires after `lifetime`.
pub fn issue_token(
    config: &AppConfig,
    user: &User,
    lifetime: Duration,
) -> AppResult<(String, DateTime<Utc>)> {
    let issued_at = Utc::now();
    let expires_at = issued_at + lifetime;
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.name().to_string(),
        name: user.full_name.clone(),
        iss: config.jwt_issuer.clone(),
        aud: config.jwt_audience.clone(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;

    Ok((token, expires_at))
}

/// decode_token
///
/// Verifies signature, issuer, audience and lifetime. An expired token is
/// reported as [`AppError::TokenExpired`] so clients can tell it apart from
/// a forged one.
pub fn decode_token(config: &AppConfig, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.jwt_issuer.as_str()]);
    validation.set_audience(&[config.jwt_audience.as_str()]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(AppError::TokenExpired),
            _ => {
                tracing::debug!(error = ?e, "rejected token");
                Err(AppError::Unauthorized("Invalid token".into()))
            }
        },
    }
}

// --- Passwords ---

/// Hashes on the blocking pool; bcrypt is CPU-bound.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// Checks `password` against a stored bcrypt hash. A malformed stored hash
/// never verifies.
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(outcome.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "stored password hash could not be verified");
        false
    }))
}

// --- Token Transport ---

/// Extracts the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extracts the front-end session token from the `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Builds the HttpOnly session cookie. `Secure` is only set in production,
/// where the service runs behind TLS.
pub fn session_cookie(config: &AppConfig, token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.env == Env::Production)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::hours(config.session_hours))
        .build()
}

/// An already-expired cookie that makes the browser drop the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}

// --- Extractors ---

/// AuthUser
///
/// The resolved identity of an authenticated API request. The role comes
/// from the database, not the token, so demotions take effect immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator role required".into()))
        }
    }
}

/// Validates `token` and loads the live, active account it names.
pub async fn resolve_token(
    repos: &Repositories,
    config: &AppConfig,
    token: &str,
) -> AppResult<AuthUser> {
    let claims = decode_token(config, token)?;
    let id: i32 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))?;

    let user = repos
        .users
        .get_by_id(id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("Account is not active".into()))?;

    Ok(AuthUser::from(&user))
}

/// AuthUser Extractor Implementation
///
/// Reads the bearer token, validates it and re-reads the account. Any
/// failure rejects the request with 401 before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Repositories: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repos = Repositories::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

        resolve_token(&repos, &config, token).await
    }
}

/// AdminUser
///
/// An [`AuthUser`] holding the Admin role. Authenticated non-admins are
/// rejected with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Repositories: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(AdminUser(user))
    }
}
