//! Session and identity provider ports.

use crate::identity::domain::{Password, ProfileAttributes, SignUpRequest, UserId, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Capability of naming the signed-in user.
///
/// The task list only needs this much of the identity provider: the user
/// segment of attachment storage keys.
#[async_trait]
pub trait SessionContext: Send + Sync {
    /// Returns the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotSignedIn`] without an active session.
    async fn current_user(&self) -> IdentityResult<UserId>;
}

/// Authentication and account attribute management.
#[async_trait]
pub trait IdentityProvider: SessionContext {
    /// Starts a session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotAuthorized`] for unknown users or wrong
    /// passwords.
    async fn sign_in(&self, username: &UserId, password: &Password) -> IdentityResult<UserProfile>;

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserExists`] when the username is taken or
    /// [`IdentityError::InvalidParameter`] when the password is rejected.
    async fn sign_up(&self, request: &SignUpRequest) -> IdentityResult<UserProfile>;

    /// Ends the current session.
    ///
    /// # Errors
    ///
    /// Returns provider failures.
    async fn sign_out(&self) -> IdentityResult<()>;

    /// Returns the signed-in user's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotSignedIn`] without an active session.
    async fn current_profile(&self) -> IdentityResult<UserProfile>;

    /// Replaces the signed-in user's name and email attributes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotSignedIn`] without an active session.
    async fn update_attributes(&self, attributes: &ProfileAttributes) -> IdentityResult<()>;

    /// Changes the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotAuthorized`] when `current` is wrong and
    /// [`IdentityError::InvalidParameter`] when `new` fails the password
    /// policy.
    async fn change_password(&self, current: &Password, new: &Password) -> IdentityResult<()>;
}

/// Errors returned by identity adapters.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// No user is signed in.
    #[error("no user is signed in")]
    NotSignedIn,

    /// Credentials were rejected.
    #[error("incorrect username or password")]
    NotAuthorized,

    /// A parameter failed provider-side validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The username is already registered.
    #[error("user already exists: {0}")]
    UserExists(UserId),

    /// Provider-side failure.
    #[error("identity provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Wraps a provider error.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }
}
