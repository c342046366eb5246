//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into several functional areas:
//!
//! - **Authentication** (`/authentication/*`): Login, current user, staff registration
//! - **Users** (`/api/v1/users/*`): Staff account management
//! - **Instruments** (`/api/v1/instruments/*`): Instrument registration, revision and usage counters
//! - **Consumables** (`/api/v1/consumables/*`): Stock intake, fresh-stock queries and unit tagging
//! - **Surgeries** (`/api/v1/surgeries/*`): Surgery records and their equipment side effects
//! - **Messages** (`/api/v1/messages/*`): Staff message box and administrator review
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! Interactive API documentation is available at `/docs` when the server is
//! running.

pub mod handlers;
pub mod models;
