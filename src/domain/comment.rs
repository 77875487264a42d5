use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserProfile;

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    /// Author profile joined by the list query.
    pub author: Option<UserProfile>,
}

/// File stored in the object bucket and referenced from the comment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// A comment needs text or at least one attachment; the workflow enforces
/// that before any backend call.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub ticket_id: i64,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Change-feed event for the comment table, scoped to one ticket.
#[derive(Debug, Clone)]
pub enum CommentChange {
    Inserted(Comment),
    Updated(Comment),
    Deleted { id: i64 },
}
