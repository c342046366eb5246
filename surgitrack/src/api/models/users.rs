//! API request/response models for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::users::{UserDBResponse, UserFilter};
use crate::types::UserId;

/// Job function of a staff member. The Chinese display labels used on
/// the wards are accepted as input aliases; storage and output use the
/// stable lowercase codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 管理员
    #[serde(alias = "管理员")]
    Administrator,
    /// 医生
    #[serde(alias = "医生")]
    Doctor,
    /// 护士
    #[serde(alias = "护士")]
    Nurse,
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    /// Hospital-issued staff id, e.g. a badge or phone number.
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
    /// Replacement staff id. Existing surgery and message references are
    /// repointed to the new id.
    pub new_id: Option<UserId>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            role: db.role,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by exact display name
    pub name: Option<String>,

    /// Filter by role
    pub role: Option<Role>,
}

impl From<&ListUsersQuery> for UserFilter {
    fn from(query: &ListUsersQuery) -> Self {
        let mut filter = UserFilter::new().skip(query.pagination.skip()).limit(query.pagination.limit());
        if let Some(name) = &query.name {
            filter = filter.name(name.clone());
        }
        if let Some(role) = query.role {
            filter = filter.role(role);
        }
        filter
    }
}

/// The authenticated caller, as decoded from the session token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self { id: db.id, name: db.name, role: db.role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_display_label_aliases() {
        let role: Role = serde_json::from_str("\"医生\"").unwrap();
        assert_eq!(role, Role::Doctor);

        let role: Role = serde_json::from_str("\"nurse\"").unwrap();
        assert_eq!(role, Role::Nurse);

        assert_eq!(serde_json::to_string(&Role::Administrator).unwrap(), "\"administrator\"");
    }
}
