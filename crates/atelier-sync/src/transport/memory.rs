//! In-memory transport for single-process deployments and tests.
//!
//! Behaves like a strict hosted pub/sub: a subscription requires a prior
//! `authenticate` on the *same* transport instance, and the channel scope
//! must match the authenticated subject. Failure injection hooks let
//! tests script rejections.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use atelier_core::AppError;
use atelier_core::AppResult;
use atelier_core::events::{ChangeEvent, ChannelStatus};
use atelier_core::traits::{EventSink, RealtimeTransport};
use atelier_core::types::credential::ChannelCredential;
use atelier_core::types::id::{SubscriptionId, UserId};

use crate::channel::scope::ChannelScope;

/// In-memory realtime transport.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    /// Channel name → subscribed sinks.
    channels: DashMap<String, Vec<(SubscriptionId, EventSink)>>,
    /// Subscription handle → channel name (reverse index).
    subscriptions: DashMap<SubscriptionId, String>,
    /// Subject of the last successfully attached credential.
    authenticated: Mutex<Option<UserId>>,
    /// Scripted failure: reject authenticate calls.
    fail_authenticate: AtomicBool,
    /// Scripted failure: reject subscribe calls.
    fail_subscribe: AtomicBool,
}

impl MemoryTransport {
    /// Creates a new transport with no attached credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `authenticate` calls fail.
    pub fn set_fail_authenticate(&self, fail: bool) {
        self.fail_authenticate.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `subscribe` calls fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Publishes an event to every subscriber of a channel.
    pub async fn publish(&self, channel: &str, event: ChangeEvent) {
        let sinks: Vec<EventSink> = self
            .channels
            .get(channel)
            .map(|subs| subs.iter().map(|(_, sink)| sink.clone()).collect())
            .unwrap_or_default();

        for sink in sinks {
            let _ = sink.events.send(event.clone()).await;
        }
    }

    /// Delivers a status update to every subscriber of a channel.
    pub async fn emit_status(&self, channel: &str, status: ChannelStatus) {
        let sinks: Vec<EventSink> = self
            .channels
            .get(channel)
            .map(|subs| subs.iter().map(|(_, sink)| sink.clone()).collect())
            .unwrap_or_default();

        for sink in sinks {
            let _ = sink.status.send(status.clone()).await;
        }
    }

    /// Returns the subscriber count for a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RealtimeTransport for MemoryTransport {
    async fn authenticate(&self, credential: &ChannelCredential) -> AppResult<()> {
        if self.fail_authenticate.load(Ordering::SeqCst) {
            return Err(AppError::authentication("Transport rejected credential"));
        }

        let mut authenticated = self
            .authenticated
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *authenticated = Some(credential.subject());
        Ok(())
    }

    async fn subscribe(&self, channel: &str, sink: EventSink) -> AppResult<SubscriptionId> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(AppError::channel("Transport rejected subscribe"));
        }

        let subject = {
            let authenticated = self
                .authenticated
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            (*authenticated).ok_or_else(|| AppError::authentication("No credential attached"))?
        };

        // Transport-side scoping: a per-user channel is only available to
        // the authenticated subject.
        match ChannelScope::parse(channel) {
            Some(ChannelScope::TenantUser { user, .. }) if user != subject => {
                return Err(AppError::authorization(format!(
                    "Channel {channel} is not available to subject {subject}"
                )));
            }
            Some(_) => {}
            None => {
                return Err(AppError::validation(format!(
                    "Unknown channel name: {channel}"
                )));
            }
        }

        let id = SubscriptionId::new();
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push((id, sink));
        self.subscriptions.insert(id, channel.to_string());
        Ok(id)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> AppResult<()> {
        if let Some((_, channel)) = self.subscriptions.remove(&subscription) {
            if let Some(mut subs) = self.channels.get_mut(&channel) {
                subs.retain(|(id, _)| *id != subscription);
                if subs.is_empty() {
                    drop(subs);
                    self.channels.remove(&channel);
                }
            }
        }
        Ok(())
    }
}
