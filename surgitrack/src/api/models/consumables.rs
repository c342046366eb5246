//! API request/response models for consumables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::consumables::{ConsumableDBResponse, ConsumableFilter, StockLevelDBResponse};
use crate::types::ConsumableId;

/// Restocking request: insert `count` fresh units of one product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub name: String,
    pub count: i64,
}

/// Tagging request: stamp a unit with the note describing its use.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagRequest {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsumableResponse {
    pub id: ConsumableId,
    pub name: String,
    /// Empty while the unit is on the shelf; the usage note afterwards.
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConsumableDBResponse> for ConsumableResponse {
    fn from(db: ConsumableDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockLevelResponse {
    pub name: String,
    /// Count of units still carrying an empty description.
    pub fresh: i64,
}

impl From<StockLevelDBResponse> for StockLevelResponse {
    fn from(db: StockLevelDBResponse) -> Self {
        Self { name: db.name, fresh: db.fresh }
    }
}

/// Query parameters for listing consumables
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListConsumablesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by id
    pub id: Option<ConsumableId>,

    /// Filter by product name
    pub name: Option<String>,

    /// Filter by exact usage note
    pub description: Option<String>,

    /// `true` keeps fresh units, `false` the consumed ones
    pub fresh: Option<bool>,

    /// Keep units restocked at or after this instant
    pub created_after: Option<DateTime<Utc>>,

    /// Keep units restocked strictly before this instant
    pub created_before: Option<DateTime<Utc>>,
}

impl From<&ListConsumablesQuery> for ConsumableFilter {
    fn from(query: &ListConsumablesQuery) -> Self {
        let mut filter = ConsumableFilter::new()
            .skip(query.pagination.skip())
            .limit(query.pagination.limit());
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(name) = &query.name {
            filter = filter.name(name.clone());
        }
        if let Some(description) = &query.description {
            filter = filter.description(description.clone());
        }
        if let Some(fresh) = query.fresh {
            filter = filter.fresh(fresh);
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

/// Query parameters for the stock view
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct StockQuery {
    /// Restrict the view to one product name
    pub name: Option<String>,
}

/// Query parameters for bulk deletion
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteConsumablesQuery {
    /// Delete by id
    pub id: Option<ConsumableId>,

    /// Delete every unit of this product
    pub name: Option<String>,

    /// Restrict deletion to fresh (`true`) or consumed (`false`) units
    pub fresh: Option<bool>,
}

impl From<&DeleteConsumablesQuery> for ConsumableFilter {
    fn from(query: &DeleteConsumablesQuery) -> Self {
        let mut filter = ConsumableFilter::new();
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(name) = &query.name {
            filter = filter.name(name.clone());
        }
        if let Some(fresh) = query.fresh {
            filter = filter.fresh(fresh);
        }
        filter
    }
}
