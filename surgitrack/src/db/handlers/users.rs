//! Database repository for users.
//!
//! User ids are hospital-issued staff ids, so creation never generates a
//! key. Names are display strings shared by several people in the worst
//! case, which is why [`Users::resolve_name`] refuses ambiguity instead
//! of guessing.

use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::api::models::users::Role;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
};
use crate::types::UserId;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(user_id = %request.id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.id)
        .bind(&request.name)
        .bind(request.role)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(&id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE 1=1");

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
        if let Some(roles) = &filter.roles {
            query.push(" AND role = ANY(");
            query.push_bind(roles);
            query.push(")");
        }

        query.push(" ORDER BY created_at DESC, id");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(skip) = filter.skip {
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        let users = query.build_query_as::<UserDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Renames repoint every surgery and message referencing the old
        // staff id, so the whole update runs in one transaction.
        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                id = COALESCE($2, id),
                name = COALESCE($3, name),
                role = COALESCE($4, role),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&request.new_id)
        .bind(&request.name)
        .bind(request.role)
        .bind(&request.password_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        if let Some(new_id) = &request.new_id {
            if *new_id != id {
                repoint_staff_id(&mut tx, &id, new_id).await?;
            }
        }

        tx.commit().await?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Returns every user with exactly the given display name.
    #[instrument(skip(self), err)]
    pub async fn find_by_name(&mut self, name: &str) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE name = $1 ORDER BY id")
            .bind(name)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users)
    }

    /// Resolves a display name to the single user carrying it.
    ///
    /// Zero matches and multiple matches are both refusals: a surgery
    /// record must point at exactly one member of staff.
    #[instrument(skip(self), err)]
    pub async fn resolve_name(&mut self, name: &str) -> Result<UserDBResponse> {
        let mut users = self.find_by_name(name).await?;

        match users.len() {
            1 => Ok(users.remove(0)),
            matches => Err(DbError::UnresolvedUser { name: name.to_string(), matches }),
        }
    }
}

/// Rewrites staff-id references after a rename, in the caller's
/// transaction.
async fn repoint_staff_id(db: &mut PgConnection, old: &UserId, new: &UserId) -> Result<()> {
    sqlx::query("UPDATE surgeries SET chief_surgeon = $2 WHERE chief_surgeon = $1")
        .bind(old)
        .bind(new)
        .execute(&mut *db)
        .await?;
    sqlx::query("UPDATE surgeries SET associate_surgeon = $2 WHERE associate_surgeon = $1")
        .bind(old)
        .bind(new)
        .execute(&mut *db)
        .await?;
    sqlx::query(
        "UPDATE surgeries SET instrument_nurses = array_replace(instrument_nurses, $1, $2) \
         WHERE $1 = ANY(instrument_nurses)",
    )
    .bind(old)
    .bind(new)
    .execute(&mut *db)
    .await?;
    sqlx::query(
        "UPDATE surgeries SET circulating_nurses = array_replace(circulating_nurses, $1, $2) \
         WHERE $1 = ANY(circulating_nurses)",
    )
    .bind(old)
    .bind(new)
    .execute(&mut *db)
    .await?;
    sqlx::query("UPDATE messages SET sender_id = $2 WHERE sender_id = $1")
        .bind(old)
        .bind(new)
        .execute(&mut *db)
        .await?;

    Ok(())
}
