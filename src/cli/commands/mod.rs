//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod check_id;
pub mod export;
pub mod init;
pub mod next_id;
pub mod schema;
pub mod validate;
