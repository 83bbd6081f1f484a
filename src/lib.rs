//! sentry-runner - process bootstrap and notification fan-out
//!
//! This library locates the process configuration, performs the one-time
//! bootstrap sequence, and dispatches already-built notifications to the
//! external channels of their recipients.
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod init;
pub mod initializer;
pub mod internal_metrics;
pub mod locator;
pub mod logging;
pub mod mimetypes;
pub mod notification;
pub mod watcher;

// Re-export core types for convenience
pub use crate::core::*;
pub use bootstrap::{BootstrapOutcome, BootstrapRequest, Bootstrapper, InvocationSurface};
pub use errors::BootstrapError;
pub use locator::{discover, ConfigLocation};
