//! Settings flow: load the profile form, save attributes and optionally
//! change the password.

use crate::identity::{
    domain::{IdentityDomainError, Password, ProfileAttributes, UserProfile},
    ports::{IdentityError, IdentityProvider},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Values shown in the settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    /// Display name (full name, given name or username).
    pub name: String,
    /// Email address, empty when unset.
    pub email: String,
}

impl From<&UserProfile> for ProfileForm {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.display_name().to_owned(),
            email: profile.email.clone().unwrap_or_default(),
        }
    }
}

/// Password change requested alongside a settings save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current: String,
    new: String,
}

impl PasswordChange {
    /// Creates a password change request.
    #[must_use]
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            new: new.into(),
        }
    }
}

/// Settings save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    attributes: ProfileAttributes,
    password_change: Option<PasswordChange>,
}

impl SettingsUpdate {
    /// Creates an update of the name and email attributes.
    #[must_use]
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>) -> Self {
        Self {
            attributes: ProfileAttributes::new(name, email),
            password_change: None,
        }
    }

    /// Also changes the password.
    ///
    /// A change with an empty new password is ignored on save.
    #[must_use]
    pub fn with_password_change(mut self, change: PasswordChange) -> Self {
        self.password_change = Some(change);
        self
    }
}

/// Errors returned by the settings flow.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The current profile could not be read.
    #[error("failed to load user data: {0}")]
    Load(#[source] IdentityError),
    /// The attribute update was rejected.
    #[error("failed to update profile attributes: {0}")]
    UpdateAttributes(#[source] IdentityError),
    /// The password change was rejected.
    #[error("failed to change password: {0}")]
    ChangePassword(#[source] IdentityError),
    /// A password field failed validation.
    #[error(transparent)]
    Domain(#[from] IdentityDomainError),
}

impl ProfileError {
    /// Message suitable for showing in the settings form.
    #[must_use]
    pub fn user_message(&self) -> String {
        let detail = match self {
            Self::Load(_) => return "Failed to load user data".to_owned(),
            Self::UpdateAttributes(source) | Self::ChangePassword(source) => match source {
                IdentityError::NotAuthorized => "Current password is incorrect".to_owned(),
                IdentityError::InvalidParameter(_) => {
                    "New password does not meet requirements".to_owned()
                }
                other => other.to_string(),
            },
            Self::Domain(source) => source.to_string(),
        };
        format!("Failed to update settings: {detail}")
    }
}

/// Result type for settings operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Settings orchestration over an identity provider.
#[derive(Clone)]
pub struct ProfileService<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> ProfileService<P>
where
    P: IdentityProvider,
{
    /// Creates a new settings service.
    #[must_use]
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Loads the form values for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Load`] when the profile cannot be read.
    pub async fn load(&self) -> ProfileResult<ProfileForm> {
        let profile = self
            .provider
            .current_profile()
            .await
            .map_err(ProfileError::Load)?;
        Ok(ProfileForm::from(&profile))
    }

    /// Saves the attributes, applies a requested password change, and
    /// returns the re-read profile.
    ///
    /// Attributes are written before the password change; a rejected
    /// password leaves the new attributes in place.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] for the first step that fails.
    pub async fn save(&self, update: SettingsUpdate) -> ProfileResult<UserProfile> {
        self.provider
            .update_attributes(&update.attributes)
            .await
            .map_err(|err| {
                warn!(error = %err, "profile attribute update failed");
                ProfileError::UpdateAttributes(err)
            })?;

        if let Some(change) = update.password_change.filter(|change| !change.new.is_empty()) {
            let current = Password::new(change.current)?;
            let new = Password::new(change.new)?;
            self.provider
                .change_password(&current, &new)
                .await
                .map_err(|err| {
                    warn!(error = %err, "password change failed");
                    ProfileError::ChangePassword(err)
                })?;
            debug!("password changed");
        }

        let profile = self
            .provider
            .current_profile()
            .await
            .map_err(ProfileError::Load)?;
        debug!(username = %profile.username, "settings saved");
        Ok(profile)
    }
}
