//! Channel manager lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the realtime channel.
///
/// `Error` is non-terminal: a credential refresh may drive the manager
/// back to `Authenticating`. `Closed` is terminal for a manager instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// No tenant/user scope attached yet.
    Idle,
    /// Verifying the credential and attaching it to the transport.
    Authenticating,
    /// Waiting for the transport to confirm the subscription.
    Subscribing,
    /// Live; inbound events are flowing.
    Subscribed,
    /// The handshake failed or the transport dropped the channel.
    Error,
    /// Torn down; the subscription has been released.
    Closed,
}

impl ChannelState {
    /// Whether the manager can start (or restart) a handshake from here.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Subscribing => "subscribing",
            Self::Subscribed => "subscribed",
            Self::Error => "error",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}
