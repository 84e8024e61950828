//! External system adapters
//!
//! This module contains adapters for external systems and services:
//! - **store**: the storage abstraction and its in-memory implementation
//! - **postgresql**: the production PostgreSQL-backed store
//!
//! Adapters translate driver errors into [`crate::domain::IrisError`]
//! variants at the boundary; nothing above this layer sees a driver type.

pub mod postgresql;
pub mod store;
