use crate::{AppState, error::AppError};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use core_types::User;
use database::DbRepository;
use std::sync::Arc;

/// Maps the username asserted by the authentication gateway to a user record.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
impl IdentityResolver for DbRepository {
    async fn resolve(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.find_user_by_username(username).await?)
    }
}

/// The authenticated caller of a request.
///
/// Authentication itself happens upstream; this only trusts the configured
/// identity header and checks that it names an active user.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub is_super_admin: bool,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(&state.identity_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .identities
            .resolve(username)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        let is_super_admin = user.username == state.super_admin;
        Ok(Identity { user, is_super_admin })
    }
}
