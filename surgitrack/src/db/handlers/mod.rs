//! Database operation handlers (repositories).
//!
//! This module contains repository structs that encapsulate all database
//! operations for each entity type. Repositories borrow a connection for
//! their lifetime, so they compose: handing a repository a transaction
//! makes every operation inside it part of that transaction.
//!
//! # Architecture
//!
//! ```text
//! API handlers
//!     |
//!     v
//! Repositories (this module)   <- business rules live here
//!     |
//!     v
//! PostgreSQL
//! ```
//!
//! # Design Principles
//!
//! - **Connection Borrowing**: Repositories take `&mut PgConnection`,
//!   accepting either a pooled connection or an open transaction
//! - **Structured Errors**: All operations return [`DbError`] variants
//!   that callers can match on, including the domain refusals
//!   (out-of-range counters, insufficient stock, ambiguous names)
//! - **Race Safety**: Counter updates and stock claims are single
//!   conditional statements or locking reads, never read-then-write
//!
//! [`DbError`]: crate::db::errors::DbError
//!
//! # Modules
//!
//! - [`repository`]: The common [`Repository`] trait
//! - [`counters`]: Monotonic id allocation for all entity kinds
//! - [`users`]: User accounts and name resolution
//! - [`instruments`]: Instrument registry and usage counters
//! - [`consumables`]: Consumable stock, allocation and tagging
//! - [`surgeries`]: Surgery recording and maintenance
//! - [`messages`]: Message board operations
//!
//! [`Repository`]: repository::Repository

pub mod counters;
pub mod consumables;
pub mod instruments;
pub mod messages;
pub mod repository;
pub mod surgeries;
pub mod users;

pub use counters::Counters;
pub use consumables::Consumables;
pub use instruments::Instruments;
pub use messages::Messages;
pub use repository::Repository;
pub use surgeries::Surgeries;
pub use users::Users;
