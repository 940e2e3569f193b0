//! Port contracts for the identity provider.

pub mod provider;

pub use provider::{IdentityError, IdentityProvider, IdentityResult, SessionContext};
