//! Consumable database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::ConsumableId;

/// A consumable unit as stored in the `consumables` table.
///
/// Every physical unit gets its own row. An empty `description` means
/// the unit is still on the shelf; a non-empty one records the surgery
/// it was used in and is never rewritten.
#[derive(Debug, Clone, FromRow)]
pub struct ConsumableDBResponse {
    pub id: ConsumableId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to register a single consumable unit.
#[derive(Debug, Clone)]
pub struct ConsumableCreateDBRequest {
    pub name: String,
    pub description: String,
}

/// A consumable demand within a surgery: which product, and the usage
/// note to stamp on each unit drawn from stock.
#[derive(Debug, Clone)]
pub struct ConsumableUseDBRequest {
    pub name: String,
    pub description: String,
}

/// Per-product stock level, counting only fresh units.
#[derive(Debug, Clone, FromRow)]
pub struct StockLevelDBResponse {
    pub name: String,
    pub fresh: i64,
}

/// Filter for listing consumables.
///
/// `fresh` selects on usage state: `true` keeps unused units (empty
/// description), `false` keeps consumed ones.
#[derive(Debug, Clone, Default)]
pub struct ConsumableFilter {
    pub ids: Option<Vec<ConsumableId>>,
    pub names: Option<Vec<String>>,
    pub descriptions: Option<Vec<String>>,
    pub fresh: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ConsumableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: ConsumableId) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptions.get_or_insert_with(Vec::new).push(description.into());
        self
    }

    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = Some(fresh);
        self
    }

    pub fn created_after(mut self, after: DateTime<Utc>) -> Self {
        self.created_after = Some(after);
        self
    }

    pub fn created_before(mut self, before: DateTime<Utc>) -> Self {
        self.created_before = Some(before);
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
