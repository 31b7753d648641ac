//! Shared building blocks for the Busmate workspace: the error taxonomy and
//! the TOML-backed application configuration.

pub mod config;
pub mod error;

pub use config::BusmateConfig;
pub use error::{BusmateError, Result};
