//! Export row filtering
//!
//! A date range narrows the scan by collection date; attribute filters
//! narrow by structured condition state. All active filters must match for
//! a patient to appear in the export (AND semantics).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::conditions::{ConditionFlag, LensStatus, OcularConditionGroup};

/// Inclusive collection-date range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a collection date falls inside the range.
    ///
    /// A record with no collection date only qualifies when the range is
    /// fully unbounded; with either bound set its position is unknowable
    /// and it is excluded.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(date) => {
                self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
            }
            None => self.is_unbounded(),
        }
    }
}

/// Filter on a tri-state condition flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagFilter {
    Absent,
    Present,
    NoData,
}

impl FlagFilter {
    fn matches<T>(&self, flag: &ConditionFlag<T>) -> bool {
        matches!(
            (self, flag),
            (FlagFilter::Absent, ConditionFlag::Absent)
                | (FlagFilter::Present, ConditionFlag::Present(_))
                | (FlagFilter::NoData, ConditionFlag::NoData)
        )
    }
}

/// Filter on the lens-status variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFilter {
    Phakic,
    Pseudophakic,
    Aphakic,
    NoData,
}

impl LensFilter {
    fn matches(&self, status: &LensStatus) -> bool {
        matches!(
            (self, status),
            (LensFilter::Phakic, LensStatus::Phakic { .. })
                | (LensFilter::Pseudophakic, LensStatus::Pseudophakic { .. })
                | (LensFilter::Aphakic, LensStatus::Aphakic { .. })
                | (LensFilter::NoData, LensStatus::NoData)
        )
    }
}

/// Structured-condition filters; `None` means "don't care"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFilters {
    pub lens_status: Option<LensFilter>,
    pub glaucoma: Option<FlagFilter>,
    pub diabetic_retinopathy: Option<FlagFilter>,
    pub macular_edema: Option<FlagFilter>,
    pub epiretinal_membrane: Option<FlagFilter>,
}

impl AttributeFilters {
    pub fn is_empty(&self) -> bool {
        self.lens_status.is_none()
            && self.glaucoma.is_none()
            && self.diabetic_retinopathy.is_none()
            && self.macular_edema.is_none()
            && self.epiretinal_membrane.is_none()
    }

    /// All set filters must match
    pub fn matches(&self, conditions: &OcularConditionGroup) -> bool {
        self.lens_status
            .is_none_or(|f| f.matches(&conditions.lens_status))
            && self.glaucoma.is_none_or(|f| f.matches(&conditions.glaucoma))
            && self
                .diabetic_retinopathy
                .is_none_or(|f| f.matches(&conditions.diabetic_retinopathy))
            && self
                .macular_edema
                .is_none_or(|f| f.matches(&conditions.macular_edema))
            && self
                .epiretinal_membrane
                .is_none_or(|f| f.matches(&conditions.epiretinal_membrane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conditions::GlaucomaDetail;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_bounds_inclusive() {
        let range = DateRange {
            from: Some(date(2023, 1, 1)),
            to: Some(date(2023, 12, 31)),
        };
        assert!(range.contains(Some(date(2023, 1, 1))));
        assert!(range.contains(Some(date(2023, 12, 31))));
        assert!(!range.contains(Some(date(2022, 12, 31))));
        assert!(!range.contains(Some(date(2024, 1, 1))));
    }

    #[test]
    fn test_missing_date_only_matches_unbounded() {
        assert!(DateRange::unbounded().contains(None));
        let lower_only = DateRange {
            from: Some(date(2023, 1, 1)),
            to: None,
        };
        assert!(!lower_only.contains(None));
        assert!(lower_only.contains(Some(date(2030, 6, 1))));
    }

    #[test]
    fn test_flag_filter() {
        let present: ConditionFlag<GlaucomaDetail> =
            ConditionFlag::Present(GlaucomaDetail::default());
        assert!(FlagFilter::Present.matches(&present));
        assert!(!FlagFilter::Absent.matches(&present));
        assert!(FlagFilter::NoData.matches(&ConditionFlag::<GlaucomaDetail>::NoData));
    }

    #[test]
    fn test_attribute_filters_and_semantics() {
        let conditions = OcularConditionGroup {
            lens_status: LensStatus::Pseudophakic { iol_type: None },
            glaucoma: ConditionFlag::Present(GlaucomaDetail::default()),
            ..OcularConditionGroup::default()
        };

        let mut filters = AttributeFilters {
            lens_status: Some(LensFilter::Pseudophakic),
            glaucoma: Some(FlagFilter::Present),
            ..AttributeFilters::default()
        };
        assert!(filters.matches(&conditions));

        filters.macular_edema = Some(FlagFilter::Present);
        assert!(!filters.matches(&conditions));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let filters = AttributeFilters::default();
        assert!(filters.is_empty());
        assert!(filters.matches(&OcularConditionGroup::default()));
    }
}
