//! Initial fetch result.

use serde::{Deserialize, Serialize};

use super::model::NotificationRecord;

/// The server's answer to an initial notification load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationBatch {
    /// Most recent records, newest first.
    pub records: Vec<NotificationRecord>,
    /// Server-authoritative unread count, which may exceed the number of
    /// unread records inside the limited `records` window.
    pub unread_count: u64,
}
