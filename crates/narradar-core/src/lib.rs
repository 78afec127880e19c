//! Core domain model and application configuration for Narradar.
//!
//! Everything downstream — collectors, persistence, the analysis store and
//! the HTTP API — speaks in the types defined here.

mod app_config;
mod config;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
