use std::sync::Arc;

use crate::{
    auth::hash_password,
    error::{AppError, AppResult},
    models::{UserDraft, UserRequest, UserView, clean},
    repository::{Repositories, UserRepository},
};

const EMAIL_IN_USE: &str = "Email is already in use";

/// UserService
///
/// Account management behind the admin user pages. Accounts are
/// soft-deleted; a deleted account's email becomes available again.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<UserView>> {
        let users = self.users.list().await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<UserView> {
        self.users
            .get_by_id(id)
            .await?
            .map(|user| UserView::from(&user))
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn create(&self, request: &UserRequest) -> AppResult<UserView> {
        request.validate_for_create()?;
        let email = request.email.trim();
        if self.users.email_taken(email, None).await? {
            return Err(AppError::Conflict(EMAIL_IN_USE.into()));
        }

        let password = request
            .password
            .as_deref()
            .ok_or_else(|| AppError::Validation("Password is required".into()))?;

        let user = self
            .users
            .add(UserDraft {
                email: email.to_string(),
                password_hash: hash_password(password).await?,
                full_name: clean(request.full_name.clone()),
                role: request.role,
                is_active: request.is_active,
                last_login_at: None,
            })
            .await?;
        tracing::info!(user_id = user.id, role = user.role.name(), "user created");
        Ok(UserView::from(&user))
    }

    /// Replaces the profile fields. The password hash only changes when a
    /// new password is supplied.
    pub async fn update(&self, id: i32, request: &UserRequest) -> AppResult<UserView> {
        request.validate_for_update()?;
        let existing = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))?;

        let email = request.email.trim();
        if !existing.email.eq_ignore_ascii_case(email) && self.users.email_taken(email, Some(id)).await? {
            return Err(AppError::Conflict(EMAIL_IN_USE.into()));
        }

        let mut draft = UserDraft::from_user(&existing);
        draft.email = email.to_string();
        draft.full_name = clean(request.full_name.clone());
        draft.role = request.role;
        draft.is_active = request.is_active;
        if let Some(password) = request.password.as_deref() {
            draft.password_hash = hash_password(password).await?;
        }

        let user = self
            .users
            .update(id, draft)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))?;
        tracing::info!(user_id = id, "user updated");
        Ok(UserView::from(&user))
    }

    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let deleted = self.users.soft_delete(id).await?;
        if deleted {
            tracing::info!(user_id = id, "user deleted");
        }
        Ok(deleted)
    }
}
