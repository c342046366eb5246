//! Message database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::api::models::messages::{MessagePriority, MessageStatus};
use crate::types::{MessageId, UserId};

/// A message row as stored in the `messages` table.
///
/// `sender_name` is denormalized at posting time so the board stays
/// readable even after the sender is renamed or removed.
#[derive(Debug, Clone, FromRow)]
pub struct MessageDBResponse {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub status: MessageStatus,
    pub priority: MessagePriority,
    pub feedback: Option<String>,
    pub content: String,
    pub inserted_at: DateTime<Utc>,
}

/// Request to post a new message.
#[derive(Debug, Clone)]
pub struct MessageCreateDBRequest {
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub priority: MessagePriority,
}

/// Request to review a message: adjust its status or priority, or
/// attach administrator feedback.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdateDBRequest {
    pub status: Option<MessageStatus>,
    pub priority: Option<MessagePriority>,
    pub feedback: Option<String>,
}

/// Filter for listing messages.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub ids: Option<Vec<MessageId>>,
    pub sender_ids: Option<Vec<UserId>>,
    pub sender_names: Option<Vec<String>>,
    pub statuses: Option<Vec<MessageStatus>>,
    pub priorities: Option<Vec<MessagePriority>>,
    pub inserted_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `inserted_at`.
    pub inserted_before: Option<DateTime<Utc>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl MessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: MessageId) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id);
        self
    }

    pub fn sender_id(mut self, id: impl Into<UserId>) -> Self {
        self.sender_ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_names.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn status(mut self, status: MessageStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn priority(mut self, priority: MessagePriority) -> Self {
        self.priorities.get_or_insert_with(Vec::new).push(priority);
        self
    }

    pub fn inserted_after(mut self, after: DateTime<Utc>) -> Self {
        self.inserted_after = Some(after);
        self
    }

    pub fn inserted_before(mut self, before: DateTime<Utc>) -> Self {
        self.inserted_before = Some(before);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}
