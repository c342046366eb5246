//! API request/response models for surgeries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::consumables::ConsumableUseDBRequest;
use crate::db::models::surgeries::{
    InstrumentUse, SurgeryDBResponse, SurgeryFilter, SurgeryRecordDBRequest, SurgeryUpdateDBRequest,
};
use crate::types::{ConsumableId, Department, SurgeryId, UserId};

/// One consumable demand: the product to draw from stock and the note to
/// stamp on the unit. An omitted note defaults to the procedure name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsumableUseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Request to record a completed surgery.
///
/// Staff are given by display name; each must match exactly one
/// registered user. Departments accept the Chinese ward name or the
/// short code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SurgeryCreate {
    pub patient_name: String,
    pub admission_number: i64,
    pub department: Department,
    pub procedure_name: String,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub chief_surgeon: String,
    pub associate_surgeon: Option<String>,
    #[serde(default)]
    pub instrument_nurses: Vec<String>,
    #[serde(default)]
    pub circulating_nurses: Vec<String>,
    #[serde(default)]
    pub instruments: Vec<InstrumentUse>,
    #[serde(default)]
    pub consumables: Vec<ConsumableUseRequest>,
}

impl From<SurgeryCreate> for SurgeryRecordDBRequest {
    fn from(api: SurgeryCreate) -> Self {
        let procedure_name = api.procedure_name;
        let consumables = api
            .consumables
            .into_iter()
            .map(|demand| ConsumableUseDBRequest {
                description: if demand.description.is_empty() {
                    procedure_name.clone()
                } else {
                    demand.description
                },
                name: demand.name,
            })
            .collect();

        Self {
            patient_name: api.patient_name,
            admission_number: api.admission_number,
            department: api.department,
            procedure_name,
            begin_time: api.begin_time,
            end_time: api.end_time,
            chief_surgeon: api.chief_surgeon,
            associate_surgeon: api.associate_surgeon,
            instrument_nurses: api.instrument_nurses,
            circulating_nurses: api.circulating_nurses,
            instruments: api.instruments,
            consumables,
        }
    }
}

/// Administrative correction of a recorded surgery. Supplying
/// `instruments` or `consumables` re-runs the stock side effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SurgeryUpdate {
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
    pub consumables: Option<Vec<ConsumableUseRequest>>,
}

impl From<SurgeryUpdate> for SurgeryUpdateDBRequest {
    fn from(api: SurgeryUpdate) -> Self {
        Self {
            patient_name: api.patient_name,
            admission_number: api.admission_number,
            department: api.department,
            procedure_name: api.procedure_name,
            date: api.date,
            begin_time: api.begin_time,
            end_time: api.end_time,
            chief_surgeon: api.chief_surgeon,
            associate_surgeon: api.associate_surgeon,
            instrument_nurses: api.instrument_nurses,
            circulating_nurses: api.circulating_nurses,
            instruments: api.instruments,
            consumables: api.consumables.map(|demands| {
                demands
                    .into_iter()
                    .map(|demand| ConsumableUseDBRequest {
                        name: demand.name,
                        description: demand.description,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SurgeryResponse {
    pub id: SurgeryId,
    pub patient_name: String,
    pub admission_number: i64,
    pub department: Department,
    pub procedure_name: String,
    /// Calendar day of the ward clock the record was stamped with
    /// (midnight), independent of the begin/end timestamps.
    pub date: DateTime<Utc>,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub chief_surgeon: UserId,
    pub associate_surgeon: Option<UserId>,
    pub instrument_nurses: Vec<UserId>,
    pub circulating_nurses: Vec<UserId>,
    pub instruments: Vec<InstrumentUse>,
    pub consumables: Vec<ConsumableId>,
    pub created_at: DateTime<Utc>,
}

impl From<SurgeryDBResponse> for SurgeryResponse {
    fn from(db: SurgeryDBResponse) -> Self {
        Self {
            id: db.id,
            patient_name: db.patient_name,
            admission_number: db.admission_number,
            department: db.department,
            procedure_name: db.procedure_name,
            date: db.date,
            begin_time: db.begin_time,
            end_time: db.end_time,
            chief_surgeon: db.chief_surgeon,
            associate_surgeon: db.associate_surgeon,
            instrument_nurses: db.instrument_nurses,
            circulating_nurses: db.circulating_nurses,
            instruments: db.instruments.0,
            consumables: db.consumables,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing surgeries
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSurgeriesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by department code or ward name
    pub department: Option<Department>,

    /// Filter by patient name
    pub patient_name: Option<String>,

    /// Filter by admission number
    pub admission_number: Option<i64>,

    /// Filter by procedure name
    pub procedure_name: Option<String>,

    /// Filter by chief surgeon staff id
    pub chief_surgeon: Option<UserId>,

    /// Keep surgeries where this staff id appears in any role
    pub staff: Option<UserId>,

    /// Keep surgeries dated at or after this instant
    pub date_from: Option<DateTime<Utc>>,

    /// Keep surgeries dated strictly before this instant
    pub date_to: Option<DateTime<Utc>>,
}

impl From<&ListSurgeriesQuery> for SurgeryFilter {
    fn from(query: &ListSurgeriesQuery) -> Self {
        let mut filter = SurgeryFilter::new()
            .skip(query.pagination.skip())
            .limit(query.pagination.limit());
        if let Some(department) = query.department {
            filter = filter.department(department);
        }
        if let Some(name) = &query.patient_name {
            filter = filter.patient_name(name.clone());
        }
        if let Some(number) = query.admission_number {
            filter = filter.admission_number(number);
        }
        if let Some(name) = &query.procedure_name {
            filter = filter.procedure_name(name.clone());
        }
        if let Some(chief) = &query.chief_surgeon {
            filter = filter.chief_surgeon(chief.clone());
        }
        if let Some(staff) = &query.staff {
            filter = filter.staff(staff.clone());
        }
        if let Some(from) = query.date_from {
            filter = filter.date_from(from);
        }
        if let Some(to) = query.date_to {
            filter = filter.date_to(to);
        }
        filter
    }
}

/// Query parameters for bulk deletion
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteSurgeriesQuery {
    /// Delete by id
    pub id: Option<SurgeryId>,

    /// Delete every record in this department
    pub department: Option<Department>,

    /// Delete every record for this patient name
    pub patient_name: Option<String>,

    /// Delete every record under this admission number
    pub admission_number: Option<i64>,

    /// Delete records dated at or after this instant
    pub date_from: Option<DateTime<Utc>>,

    /// Delete records dated strictly before this instant
    pub date_to: Option<DateTime<Utc>>,
}

impl DeleteSurgeriesQuery {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.department.is_none()
            && self.patient_name.is_none()
            && self.admission_number.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

impl From<&DeleteSurgeriesQuery> for SurgeryFilter {
    fn from(query: &DeleteSurgeriesQuery) -> Self {
        let mut filter = SurgeryFilter::new();
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(department) = query.department {
            filter = filter.department(department);
        }
        if let Some(name) = &query.patient_name {
            filter = filter.patient_name(name.clone());
        }
        if let Some(number) = query.admission_number {
            filter = filter.admission_number(number);
        }
        if let Some(from) = query.date_from {
            filter = filter.date_from(from);
        }
        if let Some(to) = query.date_to {
            filter = filter.date_to(to);
        }
        filter
    }
}
