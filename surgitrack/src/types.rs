//! Common type definitions shared across the service.
//!
//! This module defines:
//! - Type aliases for entity IDs
//! - The record kinds managed by the identifier allocator
//! - The remaining-use bounds for instruments
//! - The department name-to-code table
//! - Resource and operation enums used in authorization errors
//!
//! # ID Types
//!
//! Instruments, consumable units, surgeries and messages are keyed by
//! sequential integers handed out by the allocator. Users are keyed by an
//! externally assigned string (badge or phone number) and never go through
//! the allocator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// Type aliases for IDs
pub type InstrumentId = i64;
pub type ConsumableId = i64;
pub type SurgeryId = i64;
pub type MessageId = i64;
pub type UserId = String;

/// Lowest value an instrument counter may take; -1 marks a permanently
/// retired instrument.
pub const MIN_REMAINING_USES: i32 = -1;
/// A fresh instrument's ceiling.
pub const MAX_REMAINING_USES: i32 = 12;

/// Record kinds whose ids come from the allocator's counter rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Instrument,
    Consumable,
    Surgery,
    Message,
}

impl RecordKind {
    /// Counter row key in `id_counters`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Instrument => "instrument",
            RecordKind::Consumable => "consumable",
            RecordKind::Surgery => "surgery",
            RecordKind::Message => "message",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Surgical departments: stored and serialized as short stable codes, while
/// the ward-facing display names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Department {
    /// 肝脾外科
    #[serde(alias = "肝脾外科")]
    Hepa,
    /// 胃肠外科
    #[serde(alias = "胃肠外科")]
    Gastro,
    /// 泌尿外科
    #[serde(alias = "泌尿外科")]
    Urologic,
    /// 胆胰外科
    #[serde(alias = "胆胰外科")]
    Pancreatic,
    /// 胸外科
    #[serde(alias = "胸外科")]
    Chest,
    /// 妇科
    #[serde(alias = "妇科")]
    Gynae,
    /// 心脏外科
    #[serde(alias = "心脏外科")]
    Cardiac,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Hepa => "hepa",
            Department::Gastro => "gastro",
            Department::Urologic => "urologic",
            Department::Pancreatic => "pancreatic",
            Department::Chest => "chest",
            Department::Gynae => "gynae",
            Department::Cardiac => "cardiac",
        }
    }

    /// Ward-facing display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Department::Hepa => "肝脾外科",
            Department::Gastro => "胃肠外科",
            Department::Urologic => "泌尿外科",
            Department::Pancreatic => "胆胰外科",
            Department::Chest => "胸外科",
            Department::Gynae => "妇科",
            Department::Cardiac => "心脏外科",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    /// Accepts both the stored code and the ward-facing display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hepa" | "肝脾外科" => Ok(Department::Hepa),
            "gastro" | "胃肠外科" => Ok(Department::Gastro),
            "urologic" | "泌尿外科" => Ok(Department::Urologic),
            "pancreatic" | "胆胰外科" => Ok(Department::Pancreatic),
            "chest" | "胸外科" => Ok(Department::Chest),
            "gynae" | "妇科" => Ok(Department::Gynae),
            "cardiac" | "心脏外科" => Ok(Department::Cardiac),
            other => Err(format!("Unknown department: {other}")),
        }
    }
}

// Operations that can be performed on resources; used in authorization
// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Record,
    Review,
    Decrement,
    Tag,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Instruments,
    Consumables,
    Surgeries,
    Messages,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Record => write!(f, "record"),
            Operation::Review => write!(f, "review"),
            Operation::Decrement => write!(f, "decrement"),
            Operation::Tag => write!(f, "tag"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Instruments => write!(f, "instruments"),
            Resource::Consumables => write!(f, "consumables"),
            Resource::Surgeries => write!(f, "surgeries"),
            Resource::Messages => write!(f, "messages"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_parses_codes_and_display_names() {
        assert_eq!("hepa".parse::<Department>().unwrap(), Department::Hepa);
        assert_eq!("肝脾外科".parse::<Department>().unwrap(), Department::Hepa);
        assert_eq!("妇科".parse::<Department>().unwrap(), Department::Gynae);
        assert!("cardiology".parse::<Department>().is_err());
    }

    #[test]
    fn department_round_trips_through_code() {
        for dept in [
            Department::Hepa,
            Department::Gastro,
            Department::Urologic,
            Department::Pancreatic,
            Department::Chest,
            Department::Gynae,
            Department::Cardiac,
        ] {
            assert_eq!(dept.as_str().parse::<Department>().unwrap(), dept);
            assert_eq!(dept.display_name().parse::<Department>().unwrap(), dept);
        }
    }
}
