//! Realtime transport abstraction.
//!
//! The synchronizer never talks to a vendor pub/sub client directly; it is
//! handed an implementation of [`RealtimeTransport`] with an explicit
//! lifecycle, which keeps per-session instantiation clean and lets tests
//! substitute an in-process fake.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::events::{ChangeEvent, ChannelStatus};
use crate::result::AppResult;
use crate::types::credential::ChannelCredential;
use crate::types::id::SubscriptionId;

/// Sender half handed to the transport on subscribe.
///
/// The transport pushes inbound change events and out-of-band status
/// updates through these; the synchronizer owns the receiving ends.
#[derive(Debug, Clone)]
pub struct EventSink {
    /// Inbound change events for the subscribed channel.
    pub events: mpsc::Sender<ChangeEvent>,
    /// Subscription status updates (rejection, close).
    pub status: mpsc::Sender<ChannelStatus>,
}

impl EventSink {
    /// Creates a sink from its two senders.
    pub fn new(events: mpsc::Sender<ChangeEvent>, status: mpsc::Sender<ChannelStatus>) -> Self {
        Self { events, status }
    }
}

/// A realtime pub/sub transport scoped per tenant and user.
///
/// The credential must be attached to this specific transport instance:
/// transports that scope delivery per-principal do not pick up a session
/// established on a *different* client instance of the same library.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Attaches a credential to this transport instance.
    async fn authenticate(&self, credential: &ChannelCredential) -> AppResult<()>;

    /// Subscribes to a channel, delivering events into the sink.
    ///
    /// Returns a handle used to release the subscription later.
    async fn subscribe(&self, channel: &str, sink: EventSink) -> AppResult<SubscriptionId>;

    /// Releases a subscription.
    async fn unsubscribe(&self, subscription: SubscriptionId) -> AppResult<()>;
}
