//! User identifiers, profiles and credentials.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Username of an account; also the user segment of attachment keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyUsername`] when the value is
    /// blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyUsername);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a non-empty password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyPassword`] for an empty value.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(IdentityDomainError::EmptyPassword);
        }
        Ok(Self(raw))
    }

    /// Returns the secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the password length in characters.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Attributes held by the identity provider for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account username.
    pub username: UserId,
    /// Full name attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Given name attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Email attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    /// Creates a profile with only a username.
    #[must_use]
    pub const fn new(username: UserId) -> Self {
        Self {
            username,
            name: None,
            given_name: None,
            email: None,
        }
    }

    /// Sets the full name attribute.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the given name attribute.
    #[must_use]
    pub fn with_given_name(mut self, given_name: impl Into<String>) -> Self {
        self.given_name = Some(given_name.into());
        self
    }

    /// Sets the email attribute.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name shown to the user: full name, then given name, then username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [self.name.as_deref(), self.given_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .unwrap_or_else(|| self.username.as_str())
    }
}

/// Editable profile attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl ProfileAttributes {
    /// Creates trimmed profile attributes.
    #[must_use]
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_owned(),
            email: email.as_ref().trim().to_owned(),
        }
    }
}

/// Account registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    /// Requested username.
    pub username: UserId,
    /// Initial password.
    pub password: Password,
    /// Contact email.
    pub email: String,
}
