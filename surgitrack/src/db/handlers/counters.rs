//! Monotonic id allocation.
//!
//! Every entity kind draws its ids from a per-kind counter row instead of
//! scanning for the current maximum. The counter is advanced with a single
//! conditional statement, so concurrent allocations can never hand out the
//! same id, and ids survive deletion of the newest records. The first id
//! issued for a kind is 0.

use std::ops::Range;

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::types::RecordKind;

pub struct Counters<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Counters<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Allocates the next id for `kind`.
    #[instrument(skip(self), err)]
    pub async fn next_id(&mut self, kind: RecordKind) -> Result<i64> {
        Ok(self.next_block(kind, 1).await?.start)
    }

    /// Allocates a contiguous block of `count` ids for `kind` in one
    /// statement. Returns the half-open id range.
    ///
    /// The upsert keeps allocation atomic even if the counter row is
    /// missing; two concurrent blocks never overlap.
    #[instrument(skip(self), err)]
    pub async fn next_block(&mut self, kind: RecordKind, count: i64) -> Result<Range<i64>> {
        let end = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO id_counters (kind, next_value)
            VALUES ($1, $2)
            ON CONFLICT (kind)
            DO UPDATE SET next_value = id_counters.next_value + $2
            RETURNING next_value
            "#,
        )
        .bind(kind.as_str())
        .bind(count)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(end - count..end)
    }
}
