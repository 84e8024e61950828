//! PostgreSQL-backed patient store
//!
//! All four parts of a patient bundle are written inside a single
//! transaction. Creation relies on `INSERT ... ON CONFLICT DO NOTHING` on
//! the sensitive table: zero affected rows means another writer won the id,
//! which surfaces as a `Conflict` without ever double-assigning.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_postgres::Row;

use crate::adapters::store::PatientStore;
use crate::core::export::filters::DateRange;
use crate::domain::conditions::{ConditionRow, OcularConditionGroup};
use crate::domain::entries::{
    EntryEye, OcularMedicationEntry, OtherConditionEntry, RepeatableEntries, SurgeryEntry,
    SystemicConditionEntry, SystemicMedicationEntry,
};
use crate::domain::patient::{Eye, PatientBundle, SensitiveRecord, Sex, StatisticalRecord};
use crate::domain::reference::{MedicationRef, ReferenceCatalog, ReferenceCode};
use crate::domain::{IrisError, LinkageToken, PatientId, PersonalId, Result};

use super::client::PostgresClient;

/// Production [`PatientStore`] over PostgreSQL
pub struct PostgresStore {
    client: Arc<PostgresClient>,
}

impl PostgresStore {
    pub fn new(client: Arc<PostgresClient>) -> Self {
        Self { client }
    }
}

fn db_err(context: &str, err: tokio_postgres::Error) -> IrisError {
    IrisError::Persistence(format!("{context}: {err}"))
}

#[async_trait]
impl PatientStore for PostgresStore {
    async fn assigned_patient_ids(&self) -> Result<BTreeSet<u32>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query("SELECT patient_id FROM patients_sensitive", &[])
            .await
            .map_err(|e| db_err("Failed to list patient ids", e))?;
        Ok(rows
            .iter()
            .map(|row| row.get::<_, i32>(0) as u32)
            .collect())
    }

    async fn patient_exists(&self, id: PatientId) -> Result<bool> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM patients_sensitive WHERE patient_id = $1)",
                &[&(id.value() as i32)],
            )
            .await
            .map_err(|e| db_err("Failed to check patient existence", e))?;
        Ok(row.get(0))
    }

    async fn insert_patient(&self, bundle: &PatientBundle) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        let id = bundle.id().value() as i32;
        let sensitive = &bundle.sensitive;

        // The sensitive row is the assignment record; ON CONFLICT DO NOTHING
        // makes the occupancy check and the insert one atomic step.
        let inserted = tx
            .execute(
                "INSERT INTO patients_sensitive \
                 (patient_id, patient_name, personal_id, date_of_birth, date_of_sample_collection) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (patient_id) DO NOTHING",
                &[
                    &id,
                    &sensitive.name,
                    &sensitive.personal_id.as_str(),
                    &sensitive.birth_date,
                    &sensitive.collection_date,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to insert sensitive record", e))?;

        if inserted == 0 {
            return Err(IrisError::Conflict(format!(
                "patient id {} already assigned",
                bundle.id()
            )));
        }

        insert_statistical(&tx, &bundle.statistical).await?;
        insert_conditions(&tx, id, &bundle.conditions).await?;
        insert_entries(&tx, id, &bundle.entries).await?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit patient insert", e))?;
        Ok(())
    }

    async fn replace_patient(&self, bundle: &PatientBundle) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        let id = bundle.id().value() as i32;
        let sensitive = &bundle.sensitive;

        let updated = tx
            .execute(
                "UPDATE patients_sensitive SET \
                 patient_name = $2, personal_id = $3, date_of_birth = $4, \
                 date_of_sample_collection = $5 \
                 WHERE patient_id = $1",
                &[
                    &id,
                    &sensitive.name,
                    &sensitive.personal_id.as_str(),
                    &sensitive.birth_date,
                    &sensitive.collection_date,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to update sensitive record", e))?;

        if updated == 0 {
            return Err(IrisError::Conflict(format!(
                "patient {} no longer exists",
                bundle.id()
            )));
        }

        let statistical = &bundle.statistical;
        tx.execute(
            "UPDATE patients_statistical SET \
             linkage_token = $2, age = $3, sex = $4, eye = $5 \
             WHERE patient_id = $1",
            &[
                &id,
                &statistical.linkage_token.as_str(),
                &statistical.age,
                &statistical.sex.as_str(),
                &statistical.eye.as_str(),
            ],
        )
        .await
        .map_err(|e| db_err("Failed to update statistical record", e))?;

        // Child rows are replaced wholesale; an entry omitted from the save
        // is gone.
        tx.execute("DELETE FROM ocular_conditions WHERE patient_id = $1", &[&id])
            .await
            .map_err(|e| db_err("Failed to clear condition row", e))?;
        insert_conditions(&tx, id, &bundle.conditions).await?;

        for table in [
            "other_ocular_conditions",
            "previous_ocular_surgeries",
            "systemic_conditions",
            "ocular_medications",
            "systemic_medications",
        ] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE patient_id = $1"),
                &[&id],
            )
            .await
            .map_err(|e| db_err("Failed to clear repeatable entries", e))?;
        }
        insert_entries(&tx, id, &bundle.entries).await?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit patient replace", e))?;
        Ok(())
    }

    async fn delete_patient(&self, id: PatientId) -> Result<()> {
        let conn = self.client.get_connection().await?;
        // Child tables cascade from the sensitive row
        let deleted = conn
            .execute(
                "DELETE FROM patients_sensitive WHERE patient_id = $1",
                &[&(id.value() as i32)],
            )
            .await
            .map_err(|e| db_err("Failed to delete patient", e))?;
        if deleted == 0 {
            return Err(IrisError::NotFound(format!("patient {id} does not exist")));
        }
        Ok(())
    }

    async fn load_patient(&self, id: PatientId) -> Result<Option<PatientBundle>> {
        let range = DateRange::unbounded();
        let mut bundles = self
            .load_bundles(Some(id), &range)
            .await?;
        Ok(bundles.pop())
    }

    async fn scan_patients(&self, range: &DateRange) -> Result<Vec<PatientBundle>> {
        self.load_bundles(None, range).await
    }

    async fn load_reference_catalog(&self) -> Result<ReferenceCatalog> {
        let conn = self.client.get_connection().await?;

        let code_rows = |rows: Vec<Row>| {
            rows.iter()
                .map(|row| ReferenceCode {
                    code: row.get(0),
                    description: row.get(1),
                    active: row.get(2),
                })
                .collect::<Vec<_>>()
        };

        // The four reference queries pipeline over one connection
        let (ocular, systemic, surgeries, medications) = futures::try_join!(
            conn.query(
                "SELECT code, description, active FROM ref_ocular_condition_codes ORDER BY code",
                &[],
            ),
            conn.query(
                "SELECT code, description, active FROM ref_systemic_condition_codes ORDER BY code",
                &[],
            ),
            conn.query(
                "SELECT code, description, active FROM ref_surgery_codes ORDER BY code",
                &[],
            ),
            conn.query(
                "SELECT trade_name, generic_name, active FROM ref_medications ORDER BY trade_name",
                &[],
            ),
        )
        .map_err(|e| db_err("Failed to load reference catalog", e))?;

        Ok(ReferenceCatalog {
            ocular_codes: code_rows(ocular),
            systemic_codes: code_rows(systemic),
            surgery_codes: code_rows(surgeries),
            medications: medications
                .iter()
                .map(|row| MedicationRef {
                    trade_name: row.get(0),
                    generic_name: row.get(1),
                    active: row.get(2),
                })
                .collect(),
        })
    }
}

impl PostgresStore {
    /// Loads full bundles, either for one patient or for a collection-date
    /// range scan. Child rows are preloaded per table with `= ANY($1)` and
    /// grouped in memory rather than queried per patient.
    async fn load_bundles(
        &self,
        only: Option<PatientId>,
        range: &DateRange,
    ) -> Result<Vec<PatientBundle>> {
        let conn = self.client.get_connection().await?;

        let base = "SELECT s.patient_id, s.patient_name, s.personal_id, s.date_of_birth, \
                    s.date_of_sample_collection, t.linkage_token, t.age, t.sex, t.eye \
                    FROM patients_sensitive s \
                    JOIN patients_statistical t USING (patient_id)";

        let rows = if let Some(id) = only {
            conn.query(
                &format!("{base} WHERE s.patient_id = $1"),
                &[&(id.value() as i32)],
            )
            .await
        } else {
            match (range.from, range.to) {
                (None, None) => conn.query(&format!("{base} ORDER BY s.patient_id"), &[]).await,
                (Some(from), None) => {
                    conn.query(
                        &format!(
                            "{base} WHERE s.date_of_sample_collection >= $1 ORDER BY s.patient_id"
                        ),
                        &[&from],
                    )
                    .await
                }
                (None, Some(to)) => {
                    conn.query(
                        &format!(
                            "{base} WHERE s.date_of_sample_collection <= $1 ORDER BY s.patient_id"
                        ),
                        &[&to],
                    )
                    .await
                }
                (Some(from), Some(to)) => {
                    conn.query(
                        &format!(
                            "{base} WHERE s.date_of_sample_collection BETWEEN $1 AND $2 \
                             ORDER BY s.patient_id"
                        ),
                        &[&from, &to],
                    )
                    .await
                }
            }
        }
        .map_err(|e| db_err("Failed to load patient records", e))?;

        let mut bundles = Vec::with_capacity(rows.len());
        let mut ids: Vec<i32> = Vec::with_capacity(rows.len());
        for row in &rows {
            let bundle = bundle_from_row(row)?;
            ids.push(bundle.id().value() as i32);
            bundles.push(bundle);
        }
        if bundles.is_empty() {
            return Ok(bundles);
        }

        let mut conditions: HashMap<i32, OcularConditionGroup> = HashMap::new();
        let condition_rows = conn
            .query(
                "SELECT patient_id, lens_status, locs_iii_no, locs_iii_nc, locs_iii_c, \
                 locs_iii_p, iol_type, etiology_aphakia, glaucoma, etiology_glaucoma, \
                 steroid_responder, diabetic_retinopathy, stage_diabetic_retinopathy, \
                 macular_edema, etiology_macular_edema, epiretinal_membrane, etiology_erm, \
                 treatment_status_erm \
                 FROM ocular_conditions WHERE patient_id = ANY($1)",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load condition rows", e))?;
        for row in &condition_rows {
            let flat = ConditionRow {
                lens_status: row.get(1),
                locs_iii_no: row.get(2),
                locs_iii_nc: row.get(3),
                locs_iii_c: row.get(4),
                locs_iii_p: row.get(5),
                iol_type: row.get(6),
                etiology_aphakia: row.get(7),
                glaucoma: row.get(8),
                etiology_glaucoma: row.get(9),
                steroid_responder: row.get(10),
                diabetic_retinopathy: row.get(11),
                stage_diabetic_retinopathy: row.get(12),
                macular_edema: row.get(13),
                etiology_macular_edema: row.get(14),
                epiretinal_membrane: row.get(15),
                etiology_erm: row.get(16),
                treatment_status_erm: row.get(17),
            };
            let group =
                OcularConditionGroup::from_row(&flat).map_err(IrisError::Persistence)?;
            conditions.insert(row.get(0), group);
        }

        let mut entries: HashMap<i32, RepeatableEntries> = HashMap::new();

        let other_rows = conn
            .query(
                "SELECT patient_id, code, eye FROM other_ocular_conditions \
                 WHERE patient_id = ANY($1) ORDER BY id",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load other conditions", e))?;
        for row in &other_rows {
            entries
                .entry(row.get(0))
                .or_default()
                .other_conditions
                .push(OtherConditionEntry {
                    code: row.get(1),
                    eye: parse_entry_eye(row.get(2))?,
                });
        }

        let surgery_rows = conn
            .query(
                "SELECT patient_id, code, eye FROM previous_ocular_surgeries \
                 WHERE patient_id = ANY($1) ORDER BY id",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load surgeries", e))?;
        for row in &surgery_rows {
            entries
                .entry(row.get(0))
                .or_default()
                .surgeries
                .push(SurgeryEntry {
                    code: row.get(1),
                    eye: parse_entry_eye(row.get(2))?,
                });
        }

        let systemic_rows = conn
            .query(
                "SELECT patient_id, code FROM systemic_conditions \
                 WHERE patient_id = ANY($1) ORDER BY id",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load systemic conditions", e))?;
        for row in &systemic_rows {
            entries
                .entry(row.get(0))
                .or_default()
                .systemic_conditions
                .push(SystemicConditionEntry { code: row.get(1) });
        }

        let ocular_med_rows = conn
            .query(
                "SELECT patient_id, trade_name, generic_name, eye, last_application_days \
                 FROM ocular_medications WHERE patient_id = ANY($1) ORDER BY id",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load ocular medications", e))?;
        for row in &ocular_med_rows {
            entries
                .entry(row.get(0))
                .or_default()
                .ocular_medications
                .push(OcularMedicationEntry {
                    trade_name: row.get(1),
                    generic_name: row.get(2),
                    eye: parse_entry_eye(row.get(3))?,
                    last_application_days: row.get(4),
                });
        }

        let systemic_med_rows = conn
            .query(
                "SELECT patient_id, trade_name, generic_name, last_application_days \
                 FROM systemic_medications WHERE patient_id = ANY($1) ORDER BY id",
                &[&ids],
            )
            .await
            .map_err(|e| db_err("Failed to load systemic medications", e))?;
        for row in &systemic_med_rows {
            entries
                .entry(row.get(0))
                .or_default()
                .systemic_medications
                .push(SystemicMedicationEntry {
                    trade_name: row.get(1),
                    generic_name: row.get(2),
                    last_application_days: row.get(3),
                });
        }

        for bundle in &mut bundles {
            let key = bundle.id().value() as i32;
            if let Some(group) = conditions.remove(&key) {
                bundle.conditions = group;
            }
            if let Some(patient_entries) = entries.remove(&key) {
                bundle.entries = patient_entries;
            }
        }

        Ok(bundles)
    }
}

fn bundle_from_row(row: &Row) -> Result<PatientBundle> {
    let raw_id: i32 = row.get(0);
    let id = PatientId::new(raw_id as u32).map_err(IrisError::Persistence)?;
    let personal_id =
        PersonalId::new(row.get::<_, String>(2)).map_err(IrisError::Persistence)?;
    let linkage_token =
        LinkageToken::new(row.get::<_, String>(5)).map_err(IrisError::Persistence)?;
    let sex = Sex::parse(row.get(7)).map_err(IrisError::Persistence)?;
    let eye = Eye::parse(row.get(8)).map_err(IrisError::Persistence)?;

    Ok(PatientBundle {
        sensitive: SensitiveRecord {
            id,
            name: row.get(1),
            personal_id,
            birth_date: row.get::<_, Option<NaiveDate>>(3),
            collection_date: row.get::<_, Option<NaiveDate>>(4),
        },
        statistical: StatisticalRecord {
            id,
            linkage_token,
            age: row.get(6),
            sex,
            eye,
        },
        conditions: OcularConditionGroup::default(),
        entries: RepeatableEntries::default(),
    })
}

fn parse_entry_eye(raw: &str) -> Result<EntryEye> {
    EntryEye::parse(raw).map_err(IrisError::Persistence)
}

async fn insert_statistical<'a>(
    tx: &tokio_postgres::Transaction<'a>,
    record: &StatisticalRecord,
) -> Result<()> {
    tx.execute(
        "INSERT INTO patients_statistical (patient_id, linkage_token, age, sex, eye) \
         VALUES ($1, $2, $3, $4, $5)",
        &[
            &(record.id.value() as i32),
            &record.linkage_token.as_str(),
            &record.age,
            &record.sex.as_str(),
            &record.eye.as_str(),
        ],
    )
    .await
    .map_err(|e| db_err("Failed to insert statistical record", e))?;
    Ok(())
}

async fn insert_conditions<'a>(
    tx: &tokio_postgres::Transaction<'a>,
    id: i32,
    conditions: &OcularConditionGroup,
) -> Result<()> {
    let row = conditions.to_row();
    tx.execute(
        "INSERT INTO ocular_conditions \
         (patient_id, lens_status, locs_iii_no, locs_iii_nc, locs_iii_c, locs_iii_p, \
          iol_type, etiology_aphakia, glaucoma, etiology_glaucoma, steroid_responder, \
          diabetic_retinopathy, stage_diabetic_retinopathy, macular_edema, \
          etiology_macular_edema, epiretinal_membrane, etiology_erm, treatment_status_erm) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        &[
            &id,
            &row.lens_status,
            &row.locs_iii_no,
            &row.locs_iii_nc,
            &row.locs_iii_c,
            &row.locs_iii_p,
            &row.iol_type,
            &row.etiology_aphakia,
            &row.glaucoma,
            &row.etiology_glaucoma,
            &row.steroid_responder,
            &row.diabetic_retinopathy,
            &row.stage_diabetic_retinopathy,
            &row.macular_edema,
            &row.etiology_macular_edema,
            &row.epiretinal_membrane,
            &row.etiology_erm,
            &row.treatment_status_erm,
        ],
    )
    .await
    .map_err(|e| db_err("Failed to insert condition row", e))?;
    Ok(())
}

async fn insert_entries<'a>(
    tx: &tokio_postgres::Transaction<'a>,
    id: i32,
    entries: &RepeatableEntries,
) -> Result<()> {
    for entry in &entries.other_conditions {
        tx.execute(
            "INSERT INTO other_ocular_conditions (patient_id, code, eye) VALUES ($1, $2, $3)",
            &[&id, &entry.code, &entry.eye.as_str()],
        )
        .await
        .map_err(|e| db_err("Failed to insert other condition", e))?;
    }
    for entry in &entries.surgeries {
        tx.execute(
            "INSERT INTO previous_ocular_surgeries (patient_id, code, eye) VALUES ($1, $2, $3)",
            &[&id, &entry.code, &entry.eye.as_str()],
        )
        .await
        .map_err(|e| db_err("Failed to insert surgery", e))?;
    }
    for entry in &entries.systemic_conditions {
        tx.execute(
            "INSERT INTO systemic_conditions (patient_id, code) VALUES ($1, $2)",
            &[&id, &entry.code],
        )
        .await
        .map_err(|e| db_err("Failed to insert systemic condition", e))?;
    }
    for entry in &entries.ocular_medications {
        tx.execute(
            "INSERT INTO ocular_medications \
             (patient_id, trade_name, generic_name, eye, last_application_days) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &id,
                &entry.trade_name,
                &entry.generic_name,
                &entry.eye.as_str(),
                &entry.last_application_days,
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert ocular medication", e))?;
    }
    for entry in &entries.systemic_medications {
        tx.execute(
            "INSERT INTO systemic_medications \
             (patient_id, trade_name, generic_name, last_application_days) \
             VALUES ($1, $2, $3, $4)",
            &[
                &id,
                &entry.trade_name,
                &entry.generic_name,
                &entry.last_application_days,
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert systemic medication", e))?;
    }
    Ok(())
}
