//! Task list management for taskdeck.
//!
//! Tasks live in a remote task store; attachments live in a separate blob
//! store and are referenced from a task by key. The
//! [`services::TaskListController`] keeps a local copy of the list, refetches
//! it after every successful mutation, and records failures as a single
//! message for the presentation layer. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
