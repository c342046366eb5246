//! User database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::api::models::users::Role;
use crate::types::UserId;

/// A user row as stored in the `users` table.
///
/// The primary key is the hospital-issued staff id, not a surrogate.
/// Names are display strings and are deliberately not unique; callers
/// that resolve a name to a user must handle ambiguity.
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new user.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}

/// Request to update an existing user.
///
/// `new_id` changes the primary key; surgery records that reference the
/// old id by name-resolved staff id are repointed in the same transaction.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
    pub new_id: Option<UserId>,
}

/// Filter for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub ids: Option<Vec<UserId>>,
    pub names: Option<Vec<String>>,
    pub roles: Option<Vec<Role>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<UserId>) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.get_or_insert_with(Vec::new).push(role);
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
