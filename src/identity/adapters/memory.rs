//! In-memory identity provider for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{Password, ProfileAttributes, SignUpRequest, UserId, UserProfile},
    ports::{IdentityError, IdentityProvider, IdentityResult, SessionContext},
};

/// Shortest password accepted by [`InMemoryIdentityProvider`].
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Thread-safe in-memory identity provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    accounts: HashMap<UserId, Account>,
    session: Option<UserId>,
}

#[derive(Debug, Clone)]
struct Account {
    profile: UserProfile,
    password: Password,
}

fn lock_error(err: impl std::fmt::Display) -> IdentityError {
    IdentityError::provider(std::io::Error::other(err.to_string()))
}

fn check_password_policy(password: &Password) -> IdentityResult<()> {
    if password.char_count() < MIN_PASSWORD_CHARS {
        return Err(IdentityError::InvalidParameter(format!(
            "password must have at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

impl InMemoryIdentityState {
    fn signed_in_account(&self) -> IdentityResult<&Account> {
        let username = self.session.as_ref().ok_or(IdentityError::NotSignedIn)?;
        self.accounts.get(username).ok_or(IdentityError::NotSignedIn)
    }

    fn signed_in_account_mut(&mut self) -> IdentityResult<&mut Account> {
        let username = self.session.as_ref().ok_or(IdentityError::NotSignedIn)?;
        self.accounts
            .get_mut(username)
            .ok_or(IdentityError::NotSignedIn)
    }
}

impl InMemoryIdentityProvider {
    /// Creates a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding one account that is already signed in.
    ///
    /// The password policy is not applied to seeded accounts.
    #[must_use]
    pub fn with_signed_in_user(profile: UserProfile, password: Password) -> Self {
        let username = profile.username.clone();
        let mut accounts = HashMap::new();
        accounts.insert(username.clone(), Account { profile, password });
        Self {
            state: Arc::new(RwLock::new(InMemoryIdentityState {
                accounts,
                session: Some(username),
            })),
        }
    }
}

#[async_trait]
impl SessionContext for InMemoryIdentityProvider {
    async fn current_user(&self) -> IdentityResult<UserId> {
        let state = self.state.read().map_err(lock_error)?;
        state.session.clone().ok_or(IdentityError::NotSignedIn)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, username: &UserId, password: &Password) -> IdentityResult<UserProfile> {
        let mut state = self.state.write().map_err(lock_error)?;
        let account = state
            .accounts
            .get(username)
            .filter(|account| account.password == *password)
            .ok_or(IdentityError::NotAuthorized)?;
        let profile = account.profile.clone();
        state.session = Some(username.clone());
        Ok(profile)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> IdentityResult<UserProfile> {
        check_password_policy(&request.password)?;
        let mut state = self.state.write().map_err(lock_error)?;
        if state.accounts.contains_key(&request.username) {
            return Err(IdentityError::UserExists(request.username.clone()));
        }
        let profile = UserProfile::new(request.username.clone()).with_email(request.email.trim());
        state.accounts.insert(
            request.username.clone(),
            Account {
                profile: profile.clone(),
                password: request.password.clone(),
            },
        );
        Ok(profile)
    }

    async fn sign_out(&self) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.session = None;
        Ok(())
    }

    async fn current_profile(&self) -> IdentityResult<UserProfile> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.signed_in_account()?.profile.clone())
    }

    async fn update_attributes(&self, attributes: &ProfileAttributes) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let account = state.signed_in_account_mut()?;
        account.profile.name = Some(attributes.name.clone());
        account.profile.email = Some(attributes.email.clone());
        Ok(())
    }

    async fn change_password(&self, current: &Password, new: &Password) -> IdentityResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let account = state.signed_in_account_mut()?;
        if account.password != *current {
            return Err(IdentityError::NotAuthorized);
        }
        check_password_policy(new)?;
        account.password = new.clone();
        Ok(())
    }
}
