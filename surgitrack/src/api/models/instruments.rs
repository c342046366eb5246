//! API request/response models for instruments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::instruments::{InstrumentDBResponse, InstrumentFilter};
use crate::types::InstrumentId;

/// Initial usage counters for a batch registration: one shared value for
/// every instrument, or one value per instrument.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RemainingUsesSpec {
    Shared(i32),
    PerInstrument(Vec<i32>),
}

impl RemainingUsesSpec {
    /// Expands to one counter value per instrument name.
    pub fn resolve(&self, count: usize) -> Result<Vec<i32>, String> {
        match self {
            Self::Shared(uses) => Ok(vec![*uses; count]),
            Self::PerInstrument(values) if values.len() == count => Ok(values.clone()),
            Self::PerInstrument(values) => Err(format!(
                "got {} counter values for {} instrument names",
                values.len(),
                count
            )),
        }
    }
}

/// Batch registration request. Counters default to 12 (a fresh
/// instrument's ceiling) when not supplied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstrumentsCreate {
    pub names: Vec<String>,
    pub remaining_uses: Option<RemainingUsesSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InstrumentUpdate {
    pub name: Option<String>,
    pub remaining_uses: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DecrementRequest {
    /// How many uses to consume (default 1).
    pub by: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstrumentResponse {
    pub id: InstrumentId,
    pub name: String,
    pub remaining_uses: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InstrumentDBResponse> for InstrumentResponse {
    fn from(db: InstrumentDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            remaining_uses: db.remaining_uses,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing instruments
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListInstrumentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by id
    pub id: Option<InstrumentId>,

    /// Filter by exact name
    pub name: Option<String>,

    /// Filter by exact counter value
    pub remaining_uses: Option<i32>,

    /// `true` keeps instruments with uses left, `false` the expended and
    /// retired ones
    pub usable: Option<bool>,

    /// Keep instruments registered at or after this instant
    pub created_after: Option<DateTime<Utc>>,

    /// Keep instruments registered strictly before this instant
    pub created_before: Option<DateTime<Utc>>,
}

impl From<&ListInstrumentsQuery> for InstrumentFilter {
    fn from(query: &ListInstrumentsQuery) -> Self {
        let mut filter = InstrumentFilter::new()
            .skip(query.pagination.skip())
            .limit(query.pagination.limit());
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(name) = &query.name {
            filter = filter.name(name.clone());
        }
        if let Some(uses) = query.remaining_uses {
            filter = filter.remaining_uses(uses);
        }
        if let Some(usable) = query.usable {
            filter = filter.usable(usable);
        }
        if let Some(after) = query.created_after {
            filter = filter.created_after(after);
        }
        if let Some(before) = query.created_before {
            filter = filter.created_before(before);
        }
        filter
    }
}

/// Query parameters for bulk deletion
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteInstrumentsQuery {
    /// Delete by id
    pub id: Option<InstrumentId>,

    /// Delete every instrument with this exact name
    pub name: Option<String>,

    /// Restrict deletion to usable (`true`) or expended (`false`)
    /// instruments
    pub usable: Option<bool>,
}

impl From<&DeleteInstrumentsQuery> for InstrumentFilter {
    fn from(query: &DeleteInstrumentsQuery) -> Self {
        let mut filter = InstrumentFilter::new();
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(name) = &query.name {
            filter = filter.name(name.clone());
        }
        if let Some(usable) = query.usable {
            filter = filter.usable(usable);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_spec_accepts_scalar_or_list() {
        let create: InstrumentsCreate =
            serde_json::from_str(r#"{"names": ["电剪", "持针钳"], "remaining_uses": 5}"#).unwrap();
        let resolved = create.remaining_uses.unwrap().resolve(2).unwrap();
        assert_eq!(resolved, vec![5, 5]);

        let create: InstrumentsCreate =
            serde_json::from_str(r#"{"names": ["电剪", "持针钳"], "remaining_uses": [5, 7]}"#).unwrap();
        let resolved = create.remaining_uses.unwrap().resolve(2).unwrap();
        assert_eq!(resolved, vec![5, 7]);
    }

    #[test]
    fn test_uses_spec_rejects_length_mismatch() {
        let spec = RemainingUsesSpec::PerInstrument(vec![5, 7, 9]);
        assert!(spec.resolve(2).is_err());
    }
}
