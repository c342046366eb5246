//! Instrument database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::InstrumentId;

/// An instrument row as stored in the `instruments` table.
///
/// `remaining_uses` counts the sterilization cycles left before the
/// instrument must be retired. A fresh instrument starts at 12, zero
/// means exhausted, and -1 marks it retired from service.
#[derive(Debug, Clone, FromRow)]
pub struct InstrumentDBResponse {
    pub id: InstrumentId,
    pub name: String,
    pub remaining_uses: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to register a single instrument.
#[derive(Debug, Clone)]
pub struct InstrumentCreateDBRequest {
    pub name: String,
    pub remaining_uses: i32,
}

/// Request to update an existing instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentUpdateDBRequest {
    pub name: Option<String>,
    pub remaining_uses: Option<i32>,
}

/// Filter for listing instruments.
///
/// `usable` filters on the validity of the counter: `true` keeps
/// instruments with at least one use left, `false` keeps exhausted and
/// retired ones.
#[derive(Debug, Clone, Default)]
pub struct InstrumentFilter {
    pub ids: Option<Vec<InstrumentId>>,
    pub names: Option<Vec<String>>,
    pub remaining_uses: Option<Vec<i32>>,
    pub usable: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl InstrumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: InstrumentId) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn remaining_uses(mut self, uses: i32) -> Self {
        self.remaining_uses.get_or_insert_with(Vec::new).push(uses);
        self
    }

    pub fn usable(mut self, usable: bool) -> Self {
        self.usable = Some(usable);
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
