//! Database layer.
//!
//! Everything the application persists lives behind this module: user
//! accounts, the instrument ledger, the consumable pool, surgery records,
//! messages, and the id counters that feed them all.
//!
//! # Architecture
//!
//! ```text
//! +---------------------------+
//! |       API handlers        |
//! +---------------------------+
//!               |
//!               v
//! +---------------------------+
//! |  handlers (repositories)  |  <- operations + business rules
//! +---------------------------+
//!               |
//!               v
//! +---------------------------+
//! |   models (row structs)    |  <- create/update/response shapes
//! +---------------------------+
//!               |
//!               v
//! +---------------------------+
//! |        PostgreSQL         |  <- migrations/ defines the schema
//! +---------------------------+
//! ```
//!
//! # Key Components
//!
//! - [`handlers`]: Repository structs, one per entity, plus the shared
//!   [`Repository`] trait and the id [`Counters`]
//! - [`models`]: Request/response structs mirroring table rows
//! - [`errors`]: [`DbError`] with categorized constraint violations and
//!   the domain refusals (out-of-range, insufficient stock, ambiguous
//!   names, terminal tags)
//!
//! [`Repository`]: handlers::Repository
//! [`Counters`]: handlers::Counters
//! [`DbError`]: errors::DbError

pub mod errors;
pub mod handlers;
pub mod models;

pub use errors::{DbError, Result};
