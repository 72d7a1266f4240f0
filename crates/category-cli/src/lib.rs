//! # Category CLI
//!
//! Library half of `categoryctl`: configuration and command dispatch.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod commands;
pub mod config;

pub use commands::{Cli, Command, execute};
pub use config::{Config, LogFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
