//! Taskdeck: task list client with file attachments.
//!
//! Tasks live in a remote task service and attachments in a separate object
//! store. This crate provides the controller that keeps a local view of the
//! task list consistent with those services, the service ports and their
//! HTTP and in-memory adapters, and the identity boundary that names the
//! signed-in user.
//!
//! # Architecture
//!
//! Taskdeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure values and validation with no infrastructure
//!   dependencies
//! - **Ports**: Abstract trait interfaces for external services
//! - **Adapters**: Concrete implementations of ports (HTTP, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task list controller, task and blob store ports
//! - [`identity`]: Session context, identity provider and profile settings
//! - [`config`]: Layered client configuration
//! - [`files`]: Capability-scoped file reads

pub mod config;
pub mod files;
pub mod identity;
pub mod task;
