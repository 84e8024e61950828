//! Export projection
//!
//! The projector turns the registry's relational data into one wide row per
//! patient. Privacy level gates the leading columns; the Sensitive level is
//! refused outright for callers without the elevated role rather than
//! silently downgraded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::adapters::store::PatientStore;
use crate::domain::{AccessRole, IrisError, Result};

use super::columns::{ColumnPlan, DatasetSelection, PrivacyLevel};
use super::filters::{AttributeFilters, DateRange};

/// Everything that shapes one export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub privacy: PrivacyLevel,
    #[serde(default)]
    pub selection: DatasetSelection,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub filters: AttributeFilters,
}

impl ExportRequest {
    pub fn anonymized() -> Self {
        Self {
            privacy: PrivacyLevel::Anonymized,
            selection: DatasetSelection::default(),
            date_range: DateRange::unbounded(),
            filters: AttributeFilters::default(),
        }
    }
}

/// A finished export: fixed header plus one row per matching patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds export tables from the patient store
pub struct ExportProjector {
    store: Arc<dyn PatientStore>,
}

impl ExportProjector {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// Runs an export.
    ///
    /// A Sensitive request from a caller without the elevated role fails
    /// with `Authorization`. A request matching no patients yields the
    /// header row alone.
    #[instrument(skip(self, request), fields(privacy = ?request.privacy))]
    pub async fn generate(&self, request: &ExportRequest, role: AccessRole) -> Result<ExportTable> {
        if request.privacy == PrivacyLevel::Sensitive && !role.is_administrator() {
            return Err(IrisError::Authorization(
                "sensitive exports require the administrator role".to_string(),
            ));
        }

        let scanned = self.store.scan_patients(&request.date_range).await?;
        let matching: Vec<_> = scanned
            .into_iter()
            .filter(|p| request.filters.matches(&p.conditions))
            .collect();

        let plan = ColumnPlan::build(request.privacy, request.selection, &matching);
        let rows = matching.iter().map(|p| plan.materialize(p)).collect();

        let table = ExportTable {
            header: plan.header().to_vec(),
            rows,
        };
        info!(
            patients = table.rows.len(),
            columns = table.header.len(),
            "Generated export"
        );
        Ok(table)
    }
}
