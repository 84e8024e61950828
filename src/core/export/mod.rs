//! Export engine
//!
//! Two-pass projection of the registry into a wide, analysis-ready table:
//! column planning first, then row materialization against the fixed plan.

pub mod columns;
pub mod filters;
pub mod projector;

pub use columns::{ColumnPlan, DatasetSelection, PrivacyLevel};
pub use filters::{AttributeFilters, DateRange, FlagFilter, LensFilter};
pub use projector::{ExportProjector, ExportRequest, ExportTable};
