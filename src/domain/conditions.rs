//! Ocular condition group
//!
//! One singleton row per patient. Lens status is modeled as a tagged variant
//! so that only the active variant's sub-fields can exist at all; mutual
//! exclusivity is a property of the type, not of form handling. Independent
//! condition flags carry their conditional sub-fields inside the `Present`
//! arm for the same reason.
//!
//! The flat [`ConditionRow`] is the storage/export projection: converting a
//! group to a row nulls every column that belongs to an inactive variant, so
//! switching variants clears the previous variant's sub-fields on write.

use serde::{Deserialize, Serialize};

/// Lens status with exactly one active variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LensStatus {
    /// Natural lens present; LOCS III cataract grades apply
    Phakic {
        locs_no: Option<String>,
        locs_nc: Option<String>,
        locs_c: Option<String>,
        locs_p: Option<String>,
    },
    /// Artificial intraocular lens implanted
    Pseudophakic { iol_type: Option<String> },
    /// Lens absent
    Aphakic { etiology: Option<String> },
    #[default]
    NoData,
}

impl LensStatus {
    /// Storage encoding of the variant tag
    pub fn tag(&self) -> &'static str {
        match self {
            LensStatus::Phakic { .. } => "Phakic",
            LensStatus::Pseudophakic { .. } => "Pseudophakic",
            LensStatus::Aphakic { .. } => "Aphakic",
            LensStatus::NoData => "ND",
        }
    }
}

/// Tri-state condition flag with conditional detail
///
/// `Absent` and `NoData` carry no detail, so a flag that is switched off
/// structurally loses its sub-fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ConditionFlag<T> {
    Absent,
    Present(T),
    #[default]
    NoData,
}

impl<T> ConditionFlag<T> {
    /// Storage encoding: `0`, `1`, or `ND` as in the registry schema
    pub fn tag(&self) -> &'static str {
        match self {
            ConditionFlag::Absent => "0",
            ConditionFlag::Present(_) => "1",
            ConditionFlag::NoData => "ND",
        }
    }

    pub fn detail(&self) -> Option<&T> {
        match self {
            ConditionFlag::Present(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Sub-fields applicable only when glaucoma is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlaucomaDetail {
    pub etiology: Option<String>,
    pub steroid_responder: Option<String>,
}

/// Sub-fields applicable only when diabetic retinopathy is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetinopathyDetail {
    pub stage: Option<String>,
}

/// Sub-fields applicable only when macular edema is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MacularEdemaDetail {
    pub etiology: Option<String>,
}

/// Sub-fields applicable only when an epiretinal membrane is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErmDetail {
    pub etiology: Option<String>,
    pub treatment_status: Option<String>,
}

/// Per-patient singleton of structured ocular conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OcularConditionGroup {
    pub lens_status: LensStatus,
    pub glaucoma: ConditionFlag<GlaucomaDetail>,
    pub diabetic_retinopathy: ConditionFlag<RetinopathyDetail>,
    pub macular_edema: ConditionFlag<MacularEdemaDetail>,
    pub epiretinal_membrane: ConditionFlag<ErmDetail>,
}

/// Canonical order of the flat condition columns, used by storage and export
pub const CONDITION_COLUMNS: [&str; 17] = [
    "lens_status",
    "locs_iii_no",
    "locs_iii_nc",
    "locs_iii_c",
    "locs_iii_p",
    "iol_type",
    "etiology_aphakia",
    "glaucoma",
    "etiology_glaucoma",
    "steroid_responder",
    "diabetic_retinopathy",
    "stage_diabetic_retinopathy",
    "macular_edema",
    "etiology_macular_edema",
    "epiretinal_membrane",
    "etiology_erm",
    "treatment_status_erm",
];

/// Flat storage projection of an [`OcularConditionGroup`]
///
/// Field order matches [`CONDITION_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionRow {
    pub lens_status: String,
    pub locs_iii_no: Option<String>,
    pub locs_iii_nc: Option<String>,
    pub locs_iii_c: Option<String>,
    pub locs_iii_p: Option<String>,
    pub iol_type: Option<String>,
    pub etiology_aphakia: Option<String>,
    pub glaucoma: String,
    pub etiology_glaucoma: Option<String>,
    pub steroid_responder: Option<String>,
    pub diabetic_retinopathy: String,
    pub stage_diabetic_retinopathy: Option<String>,
    pub macular_edema: String,
    pub etiology_macular_edema: Option<String>,
    pub epiretinal_membrane: String,
    pub etiology_erm: Option<String>,
    pub treatment_status_erm: Option<String>,
}

impl OcularConditionGroup {
    /// Flattens the group for storage. Columns belonging to inactive lens
    /// variants or absent flags come out `None`, which is what makes a
    /// variant switch clear the previous variant's sub-fields.
    pub fn to_row(&self) -> ConditionRow {
        let mut row = ConditionRow {
            lens_status: self.lens_status.tag().to_string(),
            glaucoma: self.glaucoma.tag().to_string(),
            diabetic_retinopathy: self.diabetic_retinopathy.tag().to_string(),
            macular_edema: self.macular_edema.tag().to_string(),
            epiretinal_membrane: self.epiretinal_membrane.tag().to_string(),
            ..ConditionRow::default()
        };

        match &self.lens_status {
            LensStatus::Phakic {
                locs_no,
                locs_nc,
                locs_c,
                locs_p,
            } => {
                row.locs_iii_no = locs_no.clone();
                row.locs_iii_nc = locs_nc.clone();
                row.locs_iii_c = locs_c.clone();
                row.locs_iii_p = locs_p.clone();
            }
            LensStatus::Pseudophakic { iol_type } => {
                row.iol_type = iol_type.clone();
            }
            LensStatus::Aphakic { etiology } => {
                row.etiology_aphakia = etiology.clone();
            }
            LensStatus::NoData => {}
        }

        if let Some(detail) = self.glaucoma.detail() {
            row.etiology_glaucoma = detail.etiology.clone();
            row.steroid_responder = detail.steroid_responder.clone();
        }
        if let Some(detail) = self.diabetic_retinopathy.detail() {
            row.stage_diabetic_retinopathy = detail.stage.clone();
        }
        if let Some(detail) = self.macular_edema.detail() {
            row.etiology_macular_edema = detail.etiology.clone();
        }
        if let Some(detail) = self.epiretinal_membrane.detail() {
            row.etiology_erm = detail.etiology.clone();
            row.treatment_status_erm = detail.treatment_status.clone();
        }

        row
    }

    /// Rebuilds a group from its flat projection. Sub-field columns that
    /// contradict the active variant tag are dropped, so even a row written
    /// by older tooling can never surface two variants at once.
    pub fn from_row(row: &ConditionRow) -> Result<Self, String> {
        let lens_status = match row.lens_status.as_str() {
            "Phakic" => LensStatus::Phakic {
                locs_no: row.locs_iii_no.clone(),
                locs_nc: row.locs_iii_nc.clone(),
                locs_c: row.locs_iii_c.clone(),
                locs_p: row.locs_iii_p.clone(),
            },
            "Pseudophakic" => LensStatus::Pseudophakic {
                iol_type: row.iol_type.clone(),
            },
            "Aphakic" => LensStatus::Aphakic {
                etiology: row.etiology_aphakia.clone(),
            },
            "ND" => LensStatus::NoData,
            other => return Err(format!("invalid lens status: {other:?}")),
        };

        Ok(Self {
            lens_status,
            glaucoma: parse_flag(&row.glaucoma, || GlaucomaDetail {
                etiology: row.etiology_glaucoma.clone(),
                steroid_responder: row.steroid_responder.clone(),
            })?,
            diabetic_retinopathy: parse_flag(&row.diabetic_retinopathy, || RetinopathyDetail {
                stage: row.stage_diabetic_retinopathy.clone(),
            })?,
            macular_edema: parse_flag(&row.macular_edema, || MacularEdemaDetail {
                etiology: row.etiology_macular_edema.clone(),
            })?,
            epiretinal_membrane: parse_flag(&row.epiretinal_membrane, || ErmDetail {
                etiology: row.etiology_erm.clone(),
                treatment_status: row.treatment_status_erm.clone(),
            })?,
        })
    }

    /// Values of the flat columns in [`CONDITION_COLUMNS`] order, with `ND`
    /// standing in for missing sub-fields (export encoding)
    pub fn column_values(&self) -> Vec<String> {
        let row = self.to_row();
        let nd = |v: Option<String>| v.unwrap_or_else(|| "ND".to_string());
        vec![
            row.lens_status,
            nd(row.locs_iii_no),
            nd(row.locs_iii_nc),
            nd(row.locs_iii_c),
            nd(row.locs_iii_p),
            nd(row.iol_type),
            nd(row.etiology_aphakia),
            row.glaucoma,
            nd(row.etiology_glaucoma),
            nd(row.steroid_responder),
            row.diabetic_retinopathy,
            nd(row.stage_diabetic_retinopathy),
            row.macular_edema,
            nd(row.etiology_macular_edema),
            row.epiretinal_membrane,
            nd(row.etiology_erm),
            nd(row.treatment_status_erm),
        ]
    }
}

fn parse_flag<T>(tag: &str, detail: impl FnOnce() -> T) -> Result<ConditionFlag<T>, String> {
    match tag {
        "0" => Ok(ConditionFlag::Absent),
        "1" => Ok(ConditionFlag::Present(detail())),
        "ND" => Ok(ConditionFlag::NoData),
        other => Err(format!("invalid condition flag: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phakic_group() -> OcularConditionGroup {
        OcularConditionGroup {
            lens_status: LensStatus::Phakic {
                locs_no: Some("NO3".to_string()),
                locs_nc: Some("NC2".to_string()),
                locs_c: None,
                locs_p: Some("P1".to_string()),
            },
            glaucoma: ConditionFlag::Present(GlaucomaDetail {
                etiology: Some("POAG".to_string()),
                steroid_responder: Some("0".to_string()),
            }),
            ..OcularConditionGroup::default()
        }
    }

    #[test]
    fn test_to_row_populates_only_active_variant() {
        let row = phakic_group().to_row();
        assert_eq!(row.lens_status, "Phakic");
        assert_eq!(row.locs_iii_no.as_deref(), Some("NO3"));
        assert_eq!(row.iol_type, None);
        assert_eq!(row.etiology_aphakia, None);
    }

    #[test]
    fn test_variant_switch_clears_previous_sub_fields() {
        let mut group = phakic_group();
        group.lens_status = LensStatus::Pseudophakic {
            iol_type: Some("monofocal".to_string()),
        };
        let row = group.to_row();
        assert_eq!(row.lens_status, "Pseudophakic");
        assert_eq!(row.iol_type.as_deref(), Some("monofocal"));
        assert_eq!(row.locs_iii_no, None);
        assert_eq!(row.locs_iii_nc, None);
        assert_eq!(row.locs_iii_p, None);
    }

    #[test]
    fn test_absent_flag_carries_no_detail() {
        let group = OcularConditionGroup {
            glaucoma: ConditionFlag::Absent,
            ..OcularConditionGroup::default()
        };
        let row = group.to_row();
        assert_eq!(row.glaucoma, "0");
        assert_eq!(row.etiology_glaucoma, None);
        assert_eq!(row.steroid_responder, None);
    }

    #[test]
    fn test_row_round_trip() {
        let group = phakic_group();
        let back = OcularConditionGroup::from_row(&group.to_row()).unwrap();
        assert_eq!(group, back);
    }

    #[test]
    fn test_from_row_drops_contradictory_sub_fields() {
        // A hand-edited row claiming Aphakic but still carrying LOCS grades
        let row = ConditionRow {
            lens_status: "Aphakic".to_string(),
            locs_iii_no: Some("NO4".to_string()),
            etiology_aphakia: Some("trauma".to_string()),
            glaucoma: "ND".to_string(),
            diabetic_retinopathy: "ND".to_string(),
            macular_edema: "ND".to_string(),
            epiretinal_membrane: "ND".to_string(),
            ..ConditionRow::default()
        };
        let group = OcularConditionGroup::from_row(&row).unwrap();
        assert_eq!(
            group.lens_status,
            LensStatus::Aphakic {
                etiology: Some("trauma".to_string())
            }
        );
        // The stray LOCS grade is gone after the round trip
        assert_eq!(group.to_row().locs_iii_no, None);
    }

    #[test]
    fn test_from_row_rejects_unknown_tags() {
        let row = ConditionRow {
            lens_status: "Bionic".to_string(),
            glaucoma: "ND".to_string(),
            diabetic_retinopathy: "ND".to_string(),
            macular_edema: "ND".to_string(),
            epiretinal_membrane: "ND".to_string(),
            ..ConditionRow::default()
        };
        assert!(OcularConditionGroup::from_row(&row).is_err());
    }

    #[test]
    fn test_column_values_match_canonical_order() {
        let values = phakic_group().column_values();
        assert_eq!(values.len(), CONDITION_COLUMNS.len());
        assert_eq!(values[0], "Phakic");
        assert_eq!(values[7], "1"); // glaucoma flag
        assert_eq!(values[8], "POAG");
        assert_eq!(values[5], "ND"); // iol_type inapplicable
    }
}
