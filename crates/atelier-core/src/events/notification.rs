//! Notification change events and channel status updates.
//!
//! Transports deliver payloads as loose JSON values; the payload shape is
//! not trusted here. Typed extraction (and discard-on-mismatch) happens at
//! the reconciler boundary in `atelier-sync`.

use serde::{Deserialize, Serialize};

/// A change event delivered over a realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A notification row was created.
    Insert {
        /// The new record, as sent by the server.
        payload: serde_json::Value,
    },
    /// A notification row was updated.
    Update {
        /// The new state of the record.
        payload: serde_json::Value,
    },
    /// A notification row was deleted.
    Delete {
        /// The old record, or at minimum its `id`.
        payload: serde_json::Value,
    },
}

impl ChangeEvent {
    /// Returns the raw payload of the event.
    pub fn payload(&self) -> &serde_json::Value {
        match self {
            Self::Insert { payload } | Self::Update { payload } | Self::Delete { payload } => {
                payload
            }
        }
    }

    /// Returns the event kind name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Out-of-band status updates from a realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelStatus {
    /// The subscription was confirmed by the transport.
    Subscribed {
        /// Channel name.
        channel: String,
    },
    /// The transport rejected or revoked the subscription.
    Rejected {
        /// Channel name.
        channel: String,
        /// Transport-provided reason.
        reason: String,
    },
    /// The channel was closed by the transport.
    Closed {
        /// Channel name.
        channel: String,
    },
}
