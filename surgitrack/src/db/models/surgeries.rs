//! Surgery database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::db::models::consumables::ConsumableUseDBRequest;
use crate::types::{ConsumableId, Department, InstrumentId, SurgeryId, UserId};

/// Snapshot of one instrument as used in a surgery.
///
/// The `description` is the caller-supplied annotation for this use,
/// captured at recording time. It lives only inside the surgery record;
/// the instrument row itself carries no per-use notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InstrumentUse {
    pub id: InstrumentId,
    #[serde(default)]
    pub description: String,
}

/// A surgery row as stored in the `surgeries` table.
///
/// Surgeon and nurse fields hold staff ids, already resolved from the
/// display names supplied at recording time. `instruments` is the JSONB
/// snapshot list and `consumables` the ids of the units drawn from stock.
#[derive(Debug, Clone, FromRow)]
pub struct SurgeryDBResponse {
    pub id: SurgeryId,
    pub patient_name: String,
    pub admission_number: i64,
    pub department: Department,
    pub procedure_name: String,
    pub date: DateTime<Utc>,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub chief_surgeon: UserId,
    pub associate_surgeon: Option<UserId>,
    pub instrument_nurses: Vec<UserId>,
    pub circulating_nurses: Vec<UserId>,
    pub instruments: Json<Vec<InstrumentUse>>,
    pub consumables: Vec<ConsumableId>,
    pub created_at: DateTime<Utc>,
}

/// Request to record a surgery.
///
/// Staff are referenced by display name and resolved to ids during
/// recording. Instruments are referenced by id with a per-use note;
/// consumables by product name with the note to stamp on each unit.
#[derive(Debug, Clone)]
pub struct SurgeryRecordDBRequest {
    pub patient_name: String,
    pub admission_number: i64,
    pub department: Department,
    pub procedure_name: String,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub chief_surgeon: String,
    pub associate_surgeon: Option<String>,
    pub instrument_nurses: Vec<String>,
    pub circulating_nurses: Vec<String>,
    pub instruments: Vec<InstrumentUse>,
    pub consumables: Vec<ConsumableUseDBRequest>,
}

/// Request to update an existing surgery record.
///
/// Administrative fields overwrite in place. Supplying `instruments` or
/// `consumables` re-runs the corresponding stock side effects: usage
/// counters are decremented again and fresh units are drawn and tagged
/// again. Units consumed by the original record stay consumed.
#[derive(Debug, Clone, Default)]
pub struct SurgeryUpdateDBRequest {
    pub patient_name: Option<String>,
    pub admission_number: Option<i64>,
    pub department: Option<Department>,
    pub procedure_name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub begin_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub chief_surgeon: Option<String>,
    pub associate_surgeon: Option<String>,
    pub instrument_nurses: Option<Vec<String>>,
    pub circulating_nurses: Option<Vec<String>>,
    pub instruments: Option<Vec<InstrumentUse>>,
    pub consumables: Option<Vec<ConsumableUseDBRequest>>,
}

/// Filter for listing surgeries.
#[derive(Debug, Clone, Default)]
pub struct SurgeryFilter {
    pub ids: Option<Vec<SurgeryId>>,
    pub departments: Option<Vec<Department>>,
    pub patient_names: Option<Vec<String>>,
    pub admission_numbers: Option<Vec<i64>>,
    pub procedure_names: Option<Vec<String>>,
    pub chief_surgeons: Option<Vec<UserId>>,
    /// Matches surgeries where the staff id appears in any role.
    pub staff: Option<UserId>,
    pub date_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `date`.
    pub date_to: Option<DateTime<Utc>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl SurgeryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: SurgeryId) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id);
        self
    }

    pub fn department(mut self, department: Department) -> Self {
        self.departments.get_or_insert_with(Vec::new).push(department);
        self
    }

    pub fn patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn admission_number(mut self, number: i64) -> Self {
        self.admission_numbers.get_or_insert_with(Vec::new).push(number);
        self
    }

    pub fn procedure_name(mut self, name: impl Into<String>) -> Self {
        self.procedure_names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn chief_surgeon(mut self, id: impl Into<UserId>) -> Self {
        self.chief_surgeons.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    pub fn staff(mut self, id: impl Into<UserId>) -> Self {
        self.staff = Some(id.into());
        self
    }

    pub fn date_from(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn date_to(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(to);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}
