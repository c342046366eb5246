//! Role checks used by the API handlers.
//!
//! The role matrix is small and fixed:
//! - Administrators can do everything.
//! - Surgical nurses record and revise cases, decrement instrument
//!   counters and tag consumable units.
//! - Doctors post maintenance messages.
//! - Every authenticated staff member can read the registries.
//!
//! Ownership rules that depend on the specific record (users revising
//! their own name or password, doctors listing their own messages) are
//! enforced in the handlers, not here.

use crate::{
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, Resource},
};

/// Whether the user's role permits an operation on a resource.
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    if user.role == Role::Administrator {
        return true;
    }

    match (user.role, resource, operation) {
        (_, _, Operation::Read) => true,
        (Role::Nurse, Resource::Surgeries, Operation::Record | Operation::Update) => true,
        (Role::Nurse, Resource::Instruments, Operation::Decrement) => true,
        (Role::Nurse, Resource::Consumables, Operation::Tag) => true,
        (Role::Doctor, Resource::Messages, Operation::Create) => true,
        _ => false,
    }
}

/// Check a permission, turning a refusal into the 403 error the API returns.
pub fn require(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: operation,
            resource,
        })
    }
}
