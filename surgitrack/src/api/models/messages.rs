//! API request/response models for messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::messages::{MessageDBResponse, MessageFilter};
use crate::types::{MessageId, UserId};

/// Review state of a message, advanced by administrators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Unreviewed,
    Pending,
    Done,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Unimportant,
    Normal,
    Important,
}

/// Request to post a message to the administrators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageCreate {
    pub content: String,
    /// Defaults to `normal`.
    pub priority: Option<MessagePriority>,
}

/// Review request: adjust status or priority, or leave feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MessageReview {
    pub status: Option<MessageStatus>,
    pub priority: Option<MessagePriority>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub status: MessageStatus,
    pub priority: MessagePriority,
    pub feedback: Option<String>,
    pub content: String,
    pub inserted_at: DateTime<Utc>,
}

impl From<MessageDBResponse> for MessageResponse {
    fn from(db: MessageDBResponse) -> Self {
        Self {
            id: db.id,
            sender_id: db.sender_id,
            sender_name: db.sender_name,
            status: db.status,
            priority: db.priority,
            feedback: db.feedback,
            content: db.content,
            inserted_at: db.inserted_at,
        }
    }
}

/// Query parameters for listing messages
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListMessagesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by sender staff id. Ignored for non-administrators, who
    /// only ever see their own messages.
    pub sender_id: Option<UserId>,

    /// Filter by sender display name
    pub sender_name: Option<String>,

    /// Filter by review state
    pub status: Option<MessageStatus>,

    /// Filter by priority
    pub priority: Option<MessagePriority>,

    /// Keep messages posted at or after this instant
    pub inserted_after: Option<DateTime<Utc>>,

    /// Keep messages posted strictly before this instant
    pub inserted_before: Option<DateTime<Utc>>,
}

impl From<&ListMessagesQuery> for MessageFilter {
    fn from(query: &ListMessagesQuery) -> Self {
        let mut filter = MessageFilter::new()
            .skip(query.pagination.skip())
            .limit(query.pagination.limit());
        if let Some(sender) = &query.sender_id {
            filter = filter.sender_id(sender.clone());
        }
        if let Some(name) = &query.sender_name {
            filter = filter.sender_name(name.clone());
        }
        if let Some(status) = query.status {
            filter = filter.status(status);
        }
        if let Some(priority) = query.priority {
            filter = filter.priority(priority);
        }
        if let Some(after) = query.inserted_after {
            filter = filter.inserted_after(after);
        }
        if let Some(before) = query.inserted_before {
            filter = filter.inserted_before(before);
        }
        filter
    }
}

/// Query parameters for bulk deletion
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteMessagesQuery {
    /// Delete by id
    pub id: Option<MessageId>,

    /// Delete every message posted by this staff id
    pub sender_id: Option<UserId>,

    /// Delete every message posted under this display name
    pub sender_name: Option<String>,

    /// Restrict deletion to one review state
    pub status: Option<MessageStatus>,

    /// Restrict deletion to one priority
    pub priority: Option<MessagePriority>,

    /// Delete messages posted at or after this instant
    pub inserted_after: Option<DateTime<Utc>>,

    /// Delete messages posted strictly before this instant
    pub inserted_before: Option<DateTime<Utc>>,
}

impl DeleteMessagesQuery {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.sender_id.is_none()
            && self.sender_name.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.inserted_after.is_none()
            && self.inserted_before.is_none()
    }
}

impl From<&DeleteMessagesQuery> for MessageFilter {
    fn from(query: &DeleteMessagesQuery) -> Self {
        let mut filter = MessageFilter::new();
        if let Some(id) = query.id {
            filter = filter.id(id);
        }
        if let Some(sender) = &query.sender_id {
            filter = filter.sender_id(sender.clone());
        }
        if let Some(name) = &query.sender_name {
            filter = filter.sender_name(name.clone());
        }
        if let Some(status) = query.status {
            filter = filter.status(status);
        }
        if let Some(priority) = query.priority {
            filter = filter.priority(priority);
        }
        if let Some(after) = query.inserted_after {
            filter = filter.inserted_after(after);
        }
        if let Some(before) = query.inserted_before {
            filter = filter.inserted_before(before);
        }
        filter
    }
}
