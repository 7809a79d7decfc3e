use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    auth::{hash_password, issue_token, verify_password},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{LoginResponse, User, UserDraft, UserRole},
    repository::{Repositories, UserRepository},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// AuthService
///
/// Credential checks and token issuance for both the JSON API (short-lived
/// bearer tokens) and the front-end (session tokens kept in a cookie).
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    config: AppConfig,
}

impl AuthService {
    pub fn new(repos: &Repositories, config: AppConfig) -> Self {
        Self {
            users: repos.users.clone(),
            config,
        }
    }

    /// login
    ///
    /// Verifies the credentials and returns a bearer token valid for
    /// `JWT_EXPIRATION_MINUTES`. Unknown, inactive and deleted accounts all
    /// fail with the same message as a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self.authenticate(email, password).await?;
        let lifetime = Duration::minutes(self.config.jwt_expiration_minutes);
        let (token, expires_at) = issue_token(&self.config, &user, lifetime)?;

        Ok(LoginResponse {
            token,
            email: user.email,
            user_id: user.id,
            role: user.role.name().to_string(),
            expires_at,
        })
    }

    /// Same check as [`AuthService::login`], issuing the longer-lived token
    /// stored in the front-end session cookie.
    pub async fn session_login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self.authenticate(email, password).await?;
        let lifetime = Duration::hours(self.config.session_hours);
        let (token, _) = issue_token(&self.config, &user, lifetime)?;
        Ok((token, user))
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim();
        let Some(user) = self.users.find_active_by_email(email).await? else {
            tracing::warn!(%email, "login rejected: unknown or inactive account");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash).await? {
            tracing::warn!(user_id = user.id, "login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;
        tracing::info!(user_id = user.id, role = user.role.name(), "user logged in");

        Ok(User {
            last_login_at: Some(now),
            ..user
        })
    }

    /// bootstrap_admin
    ///
    /// Creates the configured `ADMIN_EMAIL` account as an active Admin when
    /// no live account uses that email. Returns the created account.
    pub async fn bootstrap_admin(&self) -> AppResult<Option<User>> {
        let (Some(email), Some(password)) = (
            self.config.admin_email.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(None);
        };

        if self.users.email_taken(email, None).await? {
            tracing::debug!(%email, "bootstrap admin already present");
            return Ok(None);
        }

        let admin = self
            .users
            .add(UserDraft {
                email: email.trim().to_string(),
                password_hash: hash_password(password).await?,
                full_name: None,
                role: UserRole::Admin,
                is_active: true,
                last_login_at: None,
            })
            .await?;
        tracing::info!(user_id = admin.id, %email, "bootstrap admin created");
        Ok(Some(admin))
    }
}
