//! Shared configuration and logging for the tutor services.
//!
//! This crate holds everything the workspace members need before any
//! business logic runs: the `~/.tutor/config.json` loader and the
//! tracing setup.

#![warn(clippy::all)]

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::init_logging;
