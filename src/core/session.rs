//! Demo authentication session backed by a local key-value store.
//!
//! There is no credential verification. The context is created once, passed to
//! the screens that need it, and is the only writer of the persisted record.

use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SESSION_KEY: &str = "user";
pub const DEMO_PASSWORD: &str = "password";
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Please log in to continue")]
    NotAuthenticated,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        Ok(())
    }
}

pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    user: RwLock<Option<User>>,
}

impl SessionContext {
    /// Reads the persisted user once. An unreadable record is treated as a
    /// signed out session.
    pub async fn init(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let stored = store
            .get(SESSION_KEY)
            .await
            .context("Failed to read persisted session")?;

        let user = stored.and_then(|raw| match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed session record");
                None
            }
        });
        debug!(authenticated = user.is_some(), "Session initialized");

        Ok(Self {
            store,
            user: RwLock::new(user),
        })
    }

    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Returns the signed in user or `AuthError::NotAuthenticated`.
    pub fn require_user(&self) -> Result<User, AuthError> {
        self.user().ok_or(AuthError::NotAuthenticated)
    }

    /// Accepts any email as long as the demo password is given.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        if password != DEMO_PASSWORD {
            info!(email, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        let name = email.split('@').next().unwrap_or(email).to_string();
        let user = User {
            email: email.to_string(),
            name,
        };
        self.persist(user).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<User> {
        request.validate()?;
        let user = User {
            email: request.email.clone(),
            name: request.name.clone(),
        };
        self.persist(user).await
    }

    pub async fn logout(&self) -> Result<()> {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store
            .remove(SESSION_KEY)
            .await
            .context("Failed to clear persisted session")?;
        info!("Logged out");
        Ok(())
    }

    async fn persist(&self, user: User) -> Result<User> {
        let raw = serde_json::to_string(&user)?;
        self.store
            .put(SESSION_KEY, &raw)
            .await
            .context("Failed to persist session")?;
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        info!(email = %user.email, "Session started");
        Ok(user)
    }
}
