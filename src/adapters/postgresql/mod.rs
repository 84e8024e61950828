//! PostgreSQL adapter
//!
//! Connection pooling via deadpool plus the production [`PostgresStore`]
//! implementation of the storage seam.

pub mod client;
pub mod store;

pub use client::PostgresClient;
pub use store::PostgresStore;
