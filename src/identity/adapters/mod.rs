//! Adapter implementations for identity ports.

pub mod memory;
pub mod session;

pub use memory::{InMemoryIdentityProvider, MIN_PASSWORD_CHARS};
pub use session::StaticSession;
