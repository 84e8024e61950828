//! Init-schema command implementation
//!
//! This module implements the `init-schema` command for creating the
//! database tables, indexes, and reference seed rows.

use crate::adapters::postgresql::PostgresClient;
use crate::config::load_config;
use clap::Args;

/// Arguments for the init-schema command
#[derive(Args, Debug)]
pub struct InitSchemaArgs {}

impl InitSchemaArgs {
    /// Execute the init-schema command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Initializing database schema");

        let config = load_config(config_path)?;
        let client = PostgresClient::new(config.database).await?;

        println!("🗄️  Initializing schema on {}", client.connection_string_safe());

        client.test_connection().await?;
        client.ensure_schema().await?;

        println!("✅ Schema initialized");
        Ok(0)
    }
}
