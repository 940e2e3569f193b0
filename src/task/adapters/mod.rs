//! Adapter implementations for task list ports.

pub mod http;
pub mod memory;
