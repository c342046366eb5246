//! Authentication and authorization system.
//!
//! This module provides the auth system for the service:
//! - Password hashing and validation with Argon2
//! - Stateless JWT bearer sessions (HS256)
//! - An extractor for the authenticated user
//! - Role checks for the three staff roles
//!
//! # Authentication
//!
//! Staff log in via `POST /authentication/login` with their staff id and
//! password, and receive a signed JWT carrying their id, display name and
//! role. Subsequent requests pass it in an `Authorization: Bearer <token>`
//! header. There is no server-side session store; tokens are valid until
//! they expire.
//!
//! # Authorization
//!
//! Access control is role-based. Administrators manage the staff directory
//! and equipment, surgical nurses record cases, doctors post maintenance
//! messages. See [`permissions`] for the role checks handlers use.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Role checks used by the API handlers
//! - [`session`]: JWT session token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use surgitrack::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", current_user.name))
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
