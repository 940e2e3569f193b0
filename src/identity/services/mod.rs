//! Application services over the identity provider.

mod profile;

pub use profile::{
    PasswordChange, ProfileError, ProfileForm, ProfileResult, ProfileService, SettingsUpdate,
};
