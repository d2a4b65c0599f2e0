//! Core module - configuration and configuration errors
//!
//! - [`Config`] - process settings from the environment
//! - [`PerksConfig`] - variants and bundle rules
//! - [`ConfigError`] - loading and validation failures

pub mod config;
pub mod error;

pub use config::{Config, PerksConfig};
pub use error::ConfigError;
