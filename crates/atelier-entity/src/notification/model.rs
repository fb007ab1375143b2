//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::types::id::{NotificationId, TenantId, UserId};

/// A notification record as seen by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Tenant this notification belongs to.
    pub tenant_id: TenantId,
    /// The recipient user.
    pub user_id: UserId,
    /// Notification category (e.g. "payment", "booking").
    #[serde(default)]
    pub category: String,
    /// Notification title.
    #[serde(default)]
    pub title: String,
    /// Notification body text.
    #[serde(default)]
    pub message: String,
    /// Additional structured data (JSON), passed through uninterpreted.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    /// Whether the user has read this notification. Monotonic false→true.
    #[serde(default)]
    pub is_read: bool,
    /// Whether the notification is visible. False means soft-deleted.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// When the notification was read.
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was clicked.
    #[serde(default)]
    pub clicked_at: Option<DateTime<Utc>>,
    /// When the notification was created. Default display order key.
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl NotificationRecord {
    /// Whether this record counts toward the unread badge.
    pub fn is_unread(&self) -> bool {
        self.is_active && !self.is_read
    }

    /// Merges a newer copy of the same record into this one.
    ///
    /// State flags are monotonic: `is_read` can only go false→true and
    /// `is_active` true→false, so a stale copy arriving out of order can
    /// never resurrect an already-read or already-removed record. The
    /// read/clicked timestamps keep their first non-null value; content
    /// fields take the incoming copy. `created_at` is immutable — it keeps
    /// the stored value, so a replayed copy with a drifted timestamp can
    /// never reorder the list.
    pub fn merge_from(&mut self, newer: NotificationRecord) {
        debug_assert_eq!(self.id, newer.id);

        self.is_read = self.is_read || newer.is_read;
        self.is_active = self.is_active && newer.is_active;
        self.read_at = self.read_at.or(newer.read_at);
        self.clicked_at = self.clicked_at.or(newer.clicked_at);

        self.category = newer.category;
        self.title = newer.title;
        self.message = newer.message;
        self.payload = newer.payload;
    }
}
