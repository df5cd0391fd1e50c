//! # Identity Store
//!
//! Registration and login checks. Credentials are compared by exact
//! equality; token signing is delegated to the [`TokenIssuer`] plugin.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AccessToken, Identity, User};
use crate::services::require;
use crate::traits::{ForumRepo, TokenIssuer};

pub struct IdentityStore {
    repo: Arc<dyn ForumRepo>,
    tokens: Arc<dyn TokenIssuer>,
}

impl IdentityStore {
    pub fn new(repo: Arc<dyn ForumRepo>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    /// Persists a new user. Uniqueness is decided by the repository insert,
    /// so two racing registrations of one name cannot both succeed.
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let username = require("username", username)?;
        require("password", password)?;

        let created = self
            .repo
            .create_user(User { username: username.to_string(), password: password.to_string() })
            .await?;
        if !created {
            return Err(AppError::AlreadyExists(username.to_string()));
        }

        log::info!("registered user {username}");
        Ok(())
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AccessToken> {
        let user = self.repo.find_user(username.trim()).await?;
        match user {
            Some(user) if user.password == password => {
                let access_token = self.tokens.issue(&user.username)?;
                Ok(AccessToken { access_token })
            }
            _ => {
                log::warn!("rejected login for {username}");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    /// Resolves a bearer token to the principal it was issued for.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .verify(token)
            .map(Identity)
            .map_err(|err| AppError::Unauthorized(err.to_string()))
    }
}
