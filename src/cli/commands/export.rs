//! Export command implementation
//!
//! This module implements the `export` command for generating a wide,
//! analysis-ready table from the registry.

use crate::adapters::postgresql::{PostgresClient, PostgresStore};
use crate::config::load_config;
use crate::core::export::{
    AttributeFilters, DatasetSelection, DateRange, ExportProjector, ExportRequest, FlagFilter,
    LensFilter, PrivacyLevel,
};
use crate::domain::AccessRole;
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Privacy level (anonymized or sensitive)
    #[arg(long, default_value = "anonymized")]
    pub privacy: String,

    /// Caller role (staff or administrator)
    #[arg(long, default_value = "staff")]
    pub role: String,

    /// Include only samples collected on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Include only samples collected on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Skip the structured condition columns
    #[arg(long)]
    pub no_conditions: bool,

    /// Skip the repeatable-entry columns (other conditions, surgeries,
    /// systemic conditions, medications)
    #[arg(long)]
    pub no_entries: bool,

    /// Only patients with this lens status
    /// (phakic, pseudophakic, aphakic, no-data)
    #[arg(long)]
    pub lens_status: Option<String>,

    /// Only patients whose glaucoma flag matches (absent, present, no-data)
    #[arg(long)]
    pub glaucoma: Option<String>,

    /// Only patients whose diabetic retinopathy flag matches
    /// (absent, present, no-data)
    #[arg(long)]
    pub diabetic_retinopathy: Option<String>,

    /// Only patients whose macular edema flag matches
    /// (absent, present, no-data)
    #[arg(long)]
    pub macular_edema: Option<String>,

    /// Only patients whose epiretinal membrane flag matches
    /// (absent, present, no-data)
    #[arg(long)]
    pub epiretinal_membrane: Option<String>,

    /// Write the table as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let privacy = match self.privacy.as_str() {
            "anonymized" => PrivacyLevel::Anonymized,
            "sensitive" => PrivacyLevel::Sensitive,
            other => {
                println!("❌ Invalid privacy level '{other}': use anonymized or sensitive");
                return Ok(2);
            }
        };
        let role = match self.role.as_str() {
            "staff" => AccessRole::Staff,
            "administrator" => AccessRole::Administrator,
            other => {
                println!("❌ Invalid role '{other}': use staff or administrator");
                return Ok(2);
            }
        };

        let date_range = DateRange {
            from: parse_date(self.from.as_deref())?,
            to: parse_date(self.to.as_deref())?,
        };

        let filters = AttributeFilters {
            lens_status: parse_lens_filter(self.lens_status.as_deref())?,
            glaucoma: parse_flag_filter(self.glaucoma.as_deref())?,
            diabetic_retinopathy: parse_flag_filter(self.diabetic_retinopathy.as_deref())?,
            macular_edema: parse_flag_filter(self.macular_edema.as_deref())?,
            epiretinal_membrane: parse_flag_filter(self.epiretinal_membrane.as_deref())?,
        };

        let selection = DatasetSelection {
            conditions: !self.no_conditions,
            other_conditions: !self.no_entries,
            surgeries: !self.no_entries,
            systemic_conditions: !self.no_entries,
            medications: !self.no_entries,
        };

        let config = load_config(config_path)?;
        let client = Arc::new(PostgresClient::new(config.database).await?);
        client.test_connection().await?;
        let store = Arc::new(PostgresStore::new(client));

        let projector = ExportProjector::new(store);
        let request = ExportRequest {
            privacy,
            selection,
            date_range,
            filters,
        };

        let table = projector.generate(&request, role).await?;
        let json = serde_json::to_string_pretty(&table)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, json)?;
                println!(
                    "✅ Exported {} patients ({} columns) to {path}",
                    table.rows.len(),
                    table.header.len()
                );
            }
            None => println!("{json}"),
        }

        Ok(0)
    }
}

fn parse_date(raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    match raw {
        Some(s) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid date {s:?}: {e}"))?;
            Ok(Some(date))
        }
        None => Ok(None),
    }
}

fn parse_lens_filter(raw: Option<&str>) -> anyhow::Result<Option<LensFilter>> {
    raw.map(|s| match s {
        "phakic" => Ok(LensFilter::Phakic),
        "pseudophakic" => Ok(LensFilter::Pseudophakic),
        "aphakic" => Ok(LensFilter::Aphakic),
        "no-data" => Ok(LensFilter::NoData),
        other => Err(anyhow::anyhow!(
            "invalid lens status {other:?}: use phakic, pseudophakic, aphakic, or no-data"
        )),
    })
    .transpose()
}

fn parse_flag_filter(raw: Option<&str>) -> anyhow::Result<Option<FlagFilter>> {
    raw.map(|s| match s {
        "absent" => Ok(FlagFilter::Absent),
        "present" => Ok(FlagFilter::Present),
        "no-data" => Ok(FlagFilter::NoData),
        other => Err(anyhow::anyhow!(
            "invalid condition filter {other:?}: use absent, present, or no-data"
        )),
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(
            parse_date(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(parse_date(Some("01.03.2024")).is_err());
    }

    #[test]
    fn test_parse_lens_filter() {
        assert_eq!(parse_lens_filter(None).unwrap(), None);
        assert_eq!(
            parse_lens_filter(Some("phakic")).unwrap(),
            Some(LensFilter::Phakic)
        );
        assert_eq!(
            parse_lens_filter(Some("no-data")).unwrap(),
            Some(LensFilter::NoData)
        );
        assert!(parse_lens_filter(Some("bionic")).is_err());
    }

    #[test]
    fn test_parse_flag_filter() {
        assert_eq!(parse_flag_filter(None).unwrap(), None);
        assert_eq!(
            parse_flag_filter(Some("present")).unwrap(),
            Some(FlagFilter::Present)
        );
        assert_eq!(
            parse_flag_filter(Some("absent")).unwrap(),
            Some(FlagFilter::Absent)
        );
        assert!(parse_flag_filter(Some("maybe")).is_err());
    }
}
