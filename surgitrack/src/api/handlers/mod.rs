//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Login, current-user lookup, and staff registration
//! - [`consumables`]: Consumable restocking, stock queries, and unit tagging
//! - [`instruments`]: Instrument registration, revision, and usage counters
//! - [`messages`]: Staff messages and administrator review
//! - [`surgeries`]: Surgery recording, revision, and lookup
//! - [`users`]: Staff account management
//!
//! # Authentication
//!
//! Handlers under `/api/v1` require a JWT bearer token. The
//! [`crate::api::models::users::CurrentUser`] extractor verifies the token and
//! provides the caller's identity and role; [`crate::auth::permissions`] holds
//! the role table handlers check before mutating anything.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod auth;
pub mod consumables;
pub mod instruments;
pub mod messages;
pub mod surgeries;
pub mod users;
