//! Resource data structures.

use serde::{Deserialize, Serialize};

/// A resource extracted from a gallery page, before dedup filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Stable identifier, the last path segment of the link
    pub identifier: String,

    /// Resource title
    pub title: String,

    /// Resource description (falls back to the title when the page has none)
    pub description: String,

    /// Absolute URL of the representative image
    pub image_url: String,

    /// Relative path to the full resource, query string stripped
    pub link: String,
}

/// A persisted resource, post-dedup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct ResourceRecord {
    /// Store key
    pub id: i64,

    /// Stable identifier, unique within the store
    pub identifier: String,

    /// Resource title
    pub title: String,

    /// Resource description
    pub description: String,

    /// Absolute URL of the representative image
    pub image_url: String,

    /// Relative path to the full resource
    pub link: String,

    /// 0 until delivered, then the Telegram message ID
    pub sent: i64,
}

impl ResourceRecord {
    /// Whether this record has already been delivered.
    pub fn is_sent(&self) -> bool {
        self.sent != 0
    }
}
