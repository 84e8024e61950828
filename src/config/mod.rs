//! Configuration management for Iris.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Iris uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`IRIS_*` prefix)
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [database]
//! connection_string = "${IRIS_DATABASE_URL}"
//! max_connections = 10
//!
//! [allocator]
//! starting_id = 1500
//!
//! [sessions]
//! edit_lock_timeout_seconds = 900
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use iris::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("iris.toml")?;
//! println!("Id suggestions start at {}", config.allocator.starting_id);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AllocatorConfig, ApplicationConfig, DatabaseConfig, Environment, IrisConfig, LoggingConfig,
    SessionConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
