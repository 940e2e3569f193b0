//! Fixed session for callers that authenticate out of band.

use async_trait::async_trait;

use crate::identity::{
    domain::UserId,
    ports::{IdentityError, IdentityResult, SessionContext},
};

/// Session whose user is supplied up front, e.g. from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSession {
    user: Option<UserId>,
}

impl StaticSession {
    /// Creates a session for `user`.
    #[must_use]
    pub const fn new(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    /// Creates a session with nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self { user: None }
    }
}

impl From<Option<UserId>> for StaticSession {
    fn from(user: Option<UserId>) -> Self {
        Self { user }
    }
}

#[async_trait]
impl SessionContext for StaticSession {
    async fn current_user(&self) -> IdentityResult<UserId> {
        self.user.clone().ok_or(IdentityError::NotSignedIn)
    }
}
