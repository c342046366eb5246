//! Database repository for instruments.
//!
//! The usage counter is the heart of this repository: every mutation of
//! `remaining_uses` happens in a single conditional statement so that
//! concurrent decrements cannot lose updates, and the schema's check
//! constraint backstops the [-1, 12] bounds against any path that slips
//! through.

use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::{counters::Counters, repository::Repository},
    models::instruments::{
        InstrumentCreateDBRequest, InstrumentDBResponse, InstrumentFilter, InstrumentUpdateDBRequest,
    },
};
use crate::types::{InstrumentId, MAX_REMAINING_USES, MIN_REMAINING_USES, RecordKind};

pub struct Instruments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Instruments<'c> {
    type CreateRequest = InstrumentCreateDBRequest;
    type UpdateRequest = InstrumentUpdateDBRequest;
    type Response = InstrumentDBResponse;
    type Id = InstrumentId;
    type Filter = InstrumentFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut created = self.insert_batch(std::slice::from_ref(request)).await?;
        Ok(created.remove(0))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let instrument = sqlx::query_as::<_, InstrumentDBResponse>("SELECT * FROM instruments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(instrument)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM instruments WHERE 1=1");

        if let Some(ids) = &filter.ids {
            query.push(" AND id = ANY(");
            query.push_bind(ids);
            query.push(")");
        }
        if let Some(names) = &filter.names {
            query.push(" AND name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(remaining_uses) = &filter.remaining_uses {
            query.push(" AND remaining_uses = ANY(");
            query.push_bind(remaining_uses);
            query.push(")");
        }
        if let Some(usable) = filter.usable {
            // A counter at 0 or below is expended; only >= 1 still has
            // sterilization cycles left.
            if usable {
                query.push(" AND remaining_uses >= 1");
            } else {
                query.push(" AND remaining_uses <= 0");
            }
        }
        if let Some(after) = filter.created_after {
            query.push(" AND created_at >= ");
            query.push_bind(after);
        }
        if let Some(before) = filter.created_before {
            query.push(" AND created_at < ");
            query.push_bind(before);
        }

        query.push(" ORDER BY id");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(skip) = filter.skip {
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        let instruments = query.build_query_as::<InstrumentDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(instruments)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM instruments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Direct set of name or counter. Counter targets outside [-1, 12]
    /// are refused, never clamped.
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        if let Some(uses) = request.remaining_uses {
            if !(MIN_REMAINING_USES..=MAX_REMAINING_USES).contains(&uses) {
                let remaining =
                    sqlx::query_scalar::<_, i32>("SELECT remaining_uses FROM instruments WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&mut *self.db)
                        .await?
                        .ok_or(DbError::NotFound)?;
                return Err(DbError::OutOfRange { id, remaining, attempted: uses });
            }
        }

        let instrument = sqlx::query_as::<_, InstrumentDBResponse>(
            r#"
            UPDATE instruments SET
                name = COALESCE($2, name),
                remaining_uses = COALESCE($3, remaining_uses),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.remaining_uses)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(instrument)
    }
}

impl<'c> Instruments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Registers a batch of instruments with sequential ids.
    ///
    /// The id block is drawn from the allocator once for the whole batch,
    /// and the inserts share a transaction with the allocation, so either
    /// the batch lands completely or the ids are burned without a row.
    #[instrument(skip(self, requests), fields(count = requests.len()), err)]
    pub async fn insert_batch(
        &mut self,
        requests: &[InstrumentCreateDBRequest],
    ) -> Result<Vec<InstrumentDBResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.begin().await?;

        let ids = Counters::new(&mut tx)
            .next_block(RecordKind::Instrument, requests.len() as i64)
            .await?;

        let mut inserted = Vec::with_capacity(requests.len());
        for (id, request) in ids.zip(requests) {
            let instrument = sqlx::query_as::<_, InstrumentDBResponse>(
                r#"
                INSERT INTO instruments (id, name, remaining_uses)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&request.name)
            .bind(request.remaining_uses)
            .fetch_one(&mut *tx)
            .await?;

            inserted.push(instrument);
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Decrements the usage counter by `by` in one conditional statement.
    ///
    /// The bounds check rides inside the UPDATE's WHERE clause, so two
    /// concurrent decrements can never both read the same counter value;
    /// the loser either applies on top of the winner or is refused.
    /// A counter at 0 may still be decremented once more to -1, which
    /// retires the instrument for good.
    #[instrument(skip(self), err)]
    pub async fn decrement(&mut self, id: InstrumentId, by: i32) -> Result<InstrumentDBResponse> {
        let updated = sqlx::query_as::<_, InstrumentDBResponse>(
            r#"
            UPDATE instruments
            SET remaining_uses = remaining_uses - $2, updated_at = NOW()
            WHERE id = $1
              AND remaining_uses - $2 >= $3
              AND remaining_uses - $2 <= $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(by)
        .bind(MIN_REMAINING_USES)
        .bind(MAX_REMAINING_USES)
        .fetch_optional(&mut *self.db)
        .await?;

        match updated {
            Some(instrument) => Ok(instrument),
            None => {
                let remaining =
                    sqlx::query_scalar::<_, i32>("SELECT remaining_uses FROM instruments WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&mut *self.db)
                        .await?
                        .ok_or(DbError::NotFound)?;
                Err(DbError::OutOfRange { id, remaining, attempted: remaining - by })
            }
        }
    }

    /// Hard-deletes every instrument matching the filter and returns how
    /// many went. Historical surgery records keep their id references.
    #[instrument(skip(self, filter), err)]
    pub async fn delete_where(&mut self, filter: &InstrumentFilter) -> Result<u64> {
        let mut query = QueryBuilder::new("DELETE FROM instruments WHERE 1=1");

        if let Some(ids) = &filter.ids {
            query.push(" AND id = ANY(");
            query.push_bind(ids);
            query.push(")");
        }
        if let Some(names) = &filter.names {
            query.push(" AND name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(usable) = filter.usable {
            if usable {
                query.push(" AND remaining_uses >= 1");
            } else {
                query.push(" AND remaining_uses <= 0");
            }
        }

        let result = query.build().execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }
}
