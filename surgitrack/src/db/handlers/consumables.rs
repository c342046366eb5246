//! Database repository for consumables.
//!
//! Stock is the set of units with an empty description. Allocation is a
//! locking claim: `FOR UPDATE SKIP LOCKED` keeps two concurrent
//! transactions off the same unit, and the claim holds until the caller's
//! transaction ends. Tagging writes the description exactly once; the
//! `description = ''` guard in the UPDATE makes the transition terminal
//! even if a stale caller races a fresh one.

use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::counters::Counters,
    models::consumables::{ConsumableDBResponse, ConsumableFilter, StockLevelDBResponse},
};
use crate::types::{ConsumableId, RecordKind};

pub struct Consumables<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Consumables<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Inserts `count` fresh units of `name` in one statement.
    ///
    /// The id block is drawn from the allocator once, up front; units get
    /// consecutive ids from that block. Restocks racing each other get
    /// disjoint blocks, so ids never collide.
    #[instrument(skip(self), err)]
    pub async fn restock(&mut self, name: &str, count: i64) -> Result<Vec<ConsumableDBResponse>> {
        if count <= 0 {
            return Ok(Vec::new());
        }

        let mut tx = self.db.begin().await?;

        let ids: Vec<ConsumableId> = Counters::new(&mut tx)
            .next_block(RecordKind::Consumable, count)
            .await?
            .collect();

        let mut units = sqlx::query_as::<_, ConsumableDBResponse>(
            r#"
            INSERT INTO consumables (id, name)
            SELECT t.id, $2 FROM unnest($1::BIGINT[]) AS t(id)
            RETURNING *
            "#,
        )
        .bind(&ids)
        .bind(name)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        units.sort_by_key(|unit| unit.id);
        Ok(units)
    }

    /// Claims up to `n` fresh units of `name`, newest first.
    ///
    /// The rows are locked with `FOR UPDATE SKIP LOCKED`, so a concurrent
    /// transaction allocating the same name is handed different units.
    /// The claim lasts until the surrounding transaction ends; callers
    /// tag the units before committing. A short (or empty) result means
    /// the stock cannot cover the request and the caller must stop.
    #[instrument(skip(self), err)]
    pub async fn allocate_freshest(&mut self, name: &str, n: i64) -> Result<Vec<ConsumableDBResponse>> {
        let units = sqlx::query_as::<_, ConsumableDBResponse>(
            r#"
            SELECT * FROM consumables
            WHERE name = $1 AND description = ''
            ORDER BY id DESC
            LIMIT $2
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(name)
        .bind(n)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(units)
    }

    /// Stamps a unit's usage description. Tagging is terminal: a unit
    /// that already carries a description is refused, whoever asks.
    ///
    /// An empty description is refused up front; writing '' would put the
    /// unit back on the shelf.
    #[instrument(skip(self, description), err)]
    pub async fn tag(&mut self, id: ConsumableId, description: &str) -> Result<ConsumableDBResponse> {
        if description.is_empty() {
            return Err(DbError::EmptyDescription { id });
        }

        let tagged = sqlx::query_as::<_, ConsumableDBResponse>(
            r#"
            UPDATE consumables
            SET description = $2, updated_at = NOW()
            WHERE id = $1 AND description = ''
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(description)
        .fetch_optional(&mut *self.db)
        .await?;

        match tagged {
            Some(unit) => Ok(unit),
            None => {
                let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM consumables WHERE id = $1")
                    .bind(id)
                    .fetch_one(&mut *self.db)
                    .await?;
                if exists > 0 {
                    Err(DbError::AlreadyTagged { id })
                } else {
                    Err(DbError::NotFound)
                }
            }
        }
    }

    /// Fresh-unit counts per product name.
    #[instrument(skip(self, names), err)]
    pub async fn stock_levels(&mut self, names: Option<&Vec<String>>) -> Result<Vec<StockLevelDBResponse>> {
        let mut query =
            QueryBuilder::new("SELECT name, COUNT(*) AS fresh FROM consumables WHERE description = ''");

        if let Some(names) = names {
            query.push(" AND name = ANY(");
            query.push_bind(names);
            query.push(")");
        }

        query.push(" GROUP BY name ORDER BY name");

        let levels = query.build_query_as::<StockLevelDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(levels)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ConsumableId) -> Result<Option<ConsumableDBResponse>> {
        let unit = sqlx::query_as::<_, ConsumableDBResponse>("SELECT * FROM consumables WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(unit)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &ConsumableFilter) -> Result<Vec<ConsumableDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM consumables WHERE 1=1");
        push_filter(&mut query, filter);

        query.push(" ORDER BY id DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(skip) = filter.skip {
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        let units = query.build_query_as::<ConsumableDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(units)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: ConsumableId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM consumables WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-deletes every unit matching the filter and returns how many
    /// went.
    #[instrument(skip(self, filter), err)]
    pub async fn delete_where(&mut self, filter: &ConsumableFilter) -> Result<u64> {
        let mut query = QueryBuilder::new("DELETE FROM consumables WHERE 1=1");
        push_filter(&mut query, filter);

        let result = query.build().execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }
}

fn push_filter<'a>(query: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a ConsumableFilter) {
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
    if let Some(descriptions) = &filter.descriptions {
        query.push(" AND description = ANY(");
        query.push_bind(descriptions);
        query.push(")");
    }
    if let Some(fresh) = filter.fresh {
        if fresh {
            query.push(" AND description = ''");
        } else {
            query.push(" AND description != ''");
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
}
