// Iris - Ophthalmic Research Registry
// Copyright (c) 2025 Iris Contributors
// Licensed under the MIT License

//! # Iris - Ophthalmic Research Registry
//!
//! Iris is the data backbone of an ophthalmology research registry: it
//! allocates human-facing patient ids, keeps a sensitive record and its
//! de-identified statistical mirror in lockstep, and projects the relational
//! data into wide, analysis-ready export tables.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Allocating** patient ids from a bounded pool, race-free across
//!   concurrent writers
//! - **Maintaining** the dual sensitive/statistical record pair as one
//!   atomic unit
//! - **De-identifying** patients via deterministic linkage tokens
//! - **Exporting** deterministic wide tables with data-driven binary columns
//!
//! ## Architecture
//!
//! Iris follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (allocation, locking, coordination, export)
//! - [`adapters`] - Storage backends (PostgreSQL, in-memory)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use iris::adapters::store::MemoryStore;
//! use iris::core::{EditLockRegistry, IdAllocator, PatientCoordinator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let allocator = Arc::new(IdAllocator::new(store.clone(), 1500)?);
//! let locks = Arc::new(EditLockRegistry::new(Duration::from_secs(900)));
//! let coordinator = PatientCoordinator::new(store, allocator, locks);
//!
//! let suggestion = coordinator.allocator().suggest().await?;
//! println!("Next patient id: {suggestion}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Iris uses the [`domain::IrisError`] type for all errors:
//!
//! ```rust
//! use iris::domain::{IrisError, PatientId};
//!
//! fn example() -> Result<PatientId, IrisError> {
//!     PatientId::new(1500).map_err(IrisError::Validation)
//! }
//! ```
//!
//! ## Logging
//!
//! Iris uses structured logging with the `tracing` crate. Log fields carry
//! patient ids only; names and personal identifiers are never logged.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
