//! Identity provider boundary.
//!
//! The task list consumes only the signed-in user's identifier through
//! [`ports::SessionContext`]. The settings flow in [`services`] reads and
//! edits profile attributes and changes passwords through
//! [`ports::IdentityProvider`].

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
