//! Check-id command implementation
//!
//! Reports whether a manually chosen patient id is currently free.

use crate::adapters::postgresql::{PostgresClient, PostgresStore};
use crate::config::load_config;
use crate::core::allocator::IdAllocator;
use crate::domain::PatientId;
use clap::Args;
use std::sync::Arc;

/// Arguments for the check-id command
#[derive(Args, Debug)]
pub struct CheckIdArgs {
    /// Patient id to check (1-99999)
    pub id: PatientId,
}

impl CheckIdArgs {
    /// Execute the check-id command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let client = Arc::new(PostgresClient::new(config.database).await?);
        client.test_connection().await?;
        let store = Arc::new(PostgresStore::new(client));

        let allocator = IdAllocator::new(store, config.allocator.starting_id)?;
        if allocator.validate_available(self.id).await? {
            println!("✅ Patient id {} is available", self.id);
            Ok(0)
        } else {
            println!("❌ Patient id {} is already taken", self.id);
            Ok(1)
        }
    }
}
