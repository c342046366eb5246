//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to
//! database table rows, plus the create/update request shapes and the
//! per-entity filter structs repositories accept.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each response model matches a table schema and
//!   derives `sqlx::FromRow`
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//! - **Explicit filters**: List operations take a named filter struct with
//!   optional one-or-many fields rather than ad hoc dictionaries
//!
//! # Modules
//!
//! - [`users`]: User accounts and the rename/update shapes
//! - [`instruments`]: Reusable instruments and their usage counters
//! - [`consumables`]: Individually tracked consumable units
//! - [`surgeries`]: Surgery records and the recording/update requests
//! - [`messages`]: Doctor-to-administrator messages

pub mod consumables;
pub mod instruments;
pub mod messages;
pub mod surgeries;
pub mod users;
