//! Next-id command implementation
//!
//! Prints the id the allocator would suggest for the next new patient. The
//! suggestion is advisory; creation remains the authoritative step.

use crate::adapters::postgresql::{PostgresClient, PostgresStore};
use crate::config::load_config;
use crate::core::allocator::IdAllocator;
use clap::Args;
use std::sync::Arc;

/// Arguments for the next-id command
#[derive(Args, Debug)]
pub struct NextIdArgs {}

impl NextIdArgs {
    /// Execute the next-id command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let client = Arc::new(PostgresClient::new(config.database).await?);
        client.test_connection().await?;
        let store = Arc::new(PostgresStore::new(client));

        let allocator = IdAllocator::new(store, config.allocator.starting_id)?;
        let suggestion = allocator.suggest().await?;

        println!("{suggestion}");
        Ok(0)
    }
}
