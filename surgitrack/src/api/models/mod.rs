//! API request/response models.
//!
//! These types define the JSON surface of the service: request payloads,
//! response shapes, and query-parameter structs for every route group.
//! They are deliberately separate from the database models in
//! [`crate::db::models`] so the wire format and the storage format can
//! evolve independently; `From` impls bridge the two.
//!
//! # Modules
//!
//! - [`auth`]: Login, registration, and password management payloads
//! - [`users`]: User accounts, the [`Role`] enum, and the authenticated
//!   [`CurrentUser`]
//! - [`instruments`]: Instrument registration, revision and decrement
//! - [`consumables`]: Restocking, tagging and the stock view
//! - [`surgeries`]: Surgery recording and maintenance
//! - [`messages`]: Message board payloads and review states
//! - [`pagination`]: Shared `skip`/`limit` query parameters
//!
//! [`Role`]: users::Role
//! [`CurrentUser`]: users::CurrentUser

pub mod auth;
pub mod consumables;
pub mod instruments;
pub mod messages;
pub mod pagination;
pub mod surgeries;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How many records a filtered bulk delete removed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}
