//! Logging infrastructure for Iris
//!
//! Structured logging built on the tracing ecosystem: a console layer for
//! development and an optional JSON file layer with daily rotation. Patient
//! names and personal identifiers are never logged; log fields carry patient
//! ids only.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
