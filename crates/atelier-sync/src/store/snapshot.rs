//! Read view of the store for rendering.

use atelier_entity::NotificationRecord;

/// A point-in-time copy of the visible records and unread count.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Visible records, newest first.
    pub records: Vec<NotificationRecord>,
    /// Unread count.
    pub unread_count: u64,
}
