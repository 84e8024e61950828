//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Iris configuration file.

use crate::config::load_config;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config already validates; a returned config is a valid one
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Environment: {:?}", config.environment);
        println!(
            "  Database: {}",
            config
                .database
                .connection_string
                .expose_secret()
                .as_ref()
                .split('@')
                .next_back()
                .unwrap_or("***")
        );
        println!("  Max Connections: {}", config.database.max_connections);
        println!("  Id Suggestions Start At: {}", config.allocator.starting_id);
        println!(
            "  Edit Lock Timeout: {}s",
            config.sessions.edit_lock_timeout_seconds
        );
        println!();
        Ok(0)
    }
}
