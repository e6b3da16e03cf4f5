//! # Busforge CLI Library
//!
//! Command line front end for the provisioning orchestrator: parses
//! arguments, loads configuration, installs logging and runs the
//! publish/subscribe walkthrough against Azure or the in-memory cloud.
//!
//! ## Modules
//!
//! - [`args`] - Command line arguments
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types of the binary
//! - [`logger`] - Logging configuration
//! - [`runner`] - Wires configuration into the orchestrator and runs it

pub mod args;
pub mod config;
pub mod error;
pub mod logger;
pub mod runner;

pub use error::{AppError, AppResult};
