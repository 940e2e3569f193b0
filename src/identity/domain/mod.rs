//! Domain model for the signed-in user.

mod error;
mod user;

pub use error::IdentityDomainError;
pub use user::{Password, ProfileAttributes, SignUpRequest, UserId, UserProfile};
