//! Channel manager — drives the authenticate/subscribe lifecycle.
//!
//! The manager holds no notification data; while subscribed, inbound
//! events flow through the [`EventSink`] handed to the transport and are
//! applied by the reconciler. Channel failures never crash the embedder:
//! they land the manager in [`ChannelState::Error`] and are logged with
//! full context, leaving fetch-based operation intact.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use atelier_core::AppError;
use atelier_core::AppResult;
use atelier_core::config::channel::ChannelConfig;
use atelier_core::events::ChannelStatus;
use atelier_core::traits::{EventSink, RealtimeTransport};
use atelier_core::types::credential::ChannelCredential;
use atelier_core::types::id::{SubscriptionId, TenantId, UserId};

use super::backoff::RetryPolicy;
use super::scope::ChannelScope;
use super::state::ChannelState;

#[derive(Debug)]
struct ManagerInner {
    state: ChannelState,
    subscription: Option<SubscriptionId>,
    retry_count: u32,
    last_attempt: Option<DateTime<Utc>>,
}

/// Manages one realtime subscription scoped to a tenant/user pair.
pub struct ChannelManager {
    /// Injected transport.
    transport: Arc<dyn RealtimeTransport>,
    /// Channel configuration.
    config: ChannelConfig,
    /// Retry gating.
    policy: RetryPolicy,
    /// Subscription scope.
    scope: ChannelScope,
    /// Lifecycle state.
    inner: Mutex<ManagerInner>,
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("scope", &self.scope)
            .field("state", &self.state())
            .finish()
    }
}

impl ChannelManager {
    /// Creates a manager for a tenant/user scope.
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        config: ChannelConfig,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            transport,
            config,
            policy,
            scope: ChannelScope::TenantUser {
                tenant: tenant_id,
                user: user_id,
            },
            inner: Mutex::new(ManagerInner {
                state: ChannelState::Idle,
                subscription: None,
                retry_count: 0,
                last_attempt: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManagerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.lock().state
    }

    /// Returns the channel name this manager subscribes to.
    pub fn channel_name(&self) -> String {
        self.scope.to_channel_name()
    }

    fn tenant_id(&self) -> TenantId {
        self.scope.tenant()
    }

    fn user_id(&self) -> UserId {
        match self.scope {
            ChannelScope::TenantUser { user, .. } => user,
            // A manager is always constructed with a user scope.
            ChannelScope::TenantBroadcast { .. } => unreachable!("manager scope is per-user"),
        }
    }

    /// Drives the handshake: verify credential, authenticate, subscribe.
    ///
    /// Allowed from `Idle`, or from `Error` once the backoff window has
    /// elapsed and the retry budget remains. Terminal once `Closed`.
    ///
    /// Returns `Ok(true)` when a new subscription was established with the
    /// given sink. While already `Subscribed` it returns `Ok(false)`: the
    /// given sink is dropped and the existing subscription keeps delivering
    /// into the one installed before, so callers must not retire that
    /// earlier sink.
    pub async fn connect(
        &self,
        credential: &ChannelCredential,
        sink: EventSink,
    ) -> AppResult<bool> {
        let channel = self.channel_name();

        {
            let mut inner = self.lock();
            if !inner.state.can_connect() {
                return match inner.state {
                    ChannelState::Subscribed => Ok(false),
                    ChannelState::Closed => Err(AppError::channel("Channel manager is closed")),
                    _ => Err(AppError::conflict("Channel handshake already in progress")),
                };
            }

            if self.policy.exhausted(inner.retry_count) {
                return Err(AppError::channel(format!(
                    "Channel retry budget exhausted after {} attempts",
                    inner.retry_count
                )));
            }
            if !self
                .policy
                .is_due(inner.last_attempt, inner.retry_count, Utc::now())
            {
                return Err(AppError::channel("Channel retry backoff has not elapsed"));
            }

            inner.state = ChannelState::Authenticating;
            inner.last_attempt = Some(Utc::now());
        }

        debug!(channel = %channel, "Channel handshake started");

        // Client-side precondition: the credential must belong to this
        // exact tenant/user scope and must not be expired. A valid
        // credential for a different principal never reaches the
        // transport handshake.
        if let Err(e) = credential.verify_scope(
            self.tenant_id(),
            self.user_id(),
            self.config.credential_leeway_seconds,
        ) {
            warn!(
                channel = %channel,
                tenant_id = %self.tenant_id(),
                user_id = %self.user_id(),
                credential_subject = %credential.subject(),
                error = %e,
                "Channel credential rejected before handshake"
            );
            self.mark_error();
            return Err(e);
        }

        let auth_bound = Duration::from_secs(self.config.auth_timeout_seconds);
        match timeout(auth_bound, self.transport.authenticate(credential)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(channel = %channel, error = %e, "Transport authentication failed");
                self.mark_error();
                return Err(e);
            }
            Err(_) => {
                warn!(channel = %channel, "Transport authentication timed out");
                self.mark_error();
                return Err(AppError::timeout("Transport authentication timed out"));
            }
        }

        self.lock().state = ChannelState::Subscribing;

        let subscribe_bound = Duration::from_secs(self.config.subscribe_timeout_seconds);
        let subscription =
            match timeout(subscribe_bound, self.transport.subscribe(&channel, sink)).await {
                Ok(Ok(id)) => id,
                Ok(Err(e)) => {
                    warn!(
                        channel = %channel,
                        tenant_id = %self.tenant_id(),
                        user_id = %self.user_id(),
                        credential_subject = %credential.subject(),
                        error = %e,
                        "Channel subscribe rejected"
                    );
                    self.mark_error();
                    return Err(e);
                }
                Err(_) => {
                    warn!(channel = %channel, "Channel subscribe timed out");
                    self.mark_error();
                    return Err(AppError::timeout("Channel subscribe timed out"));
                }
            };

        {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                // Torn down while the handshake was in flight.
                drop(inner);
                let _ = self.transport.unsubscribe(subscription).await;
                return Err(AppError::channel("Channel closed during handshake"));
            }
            inner.subscription = Some(subscription);
            inner.state = ChannelState::Subscribed;
            inner.retry_count = 0;
        }

        info!(
            channel = %channel,
            tenant_id = %self.tenant_id(),
            user_id = %self.user_id(),
            "Realtime channel subscribed"
        );
        Ok(true)
    }

    /// Handles an out-of-band status update from the transport.
    pub fn on_status(&self, status: ChannelStatus) {
        match status {
            ChannelStatus::Subscribed { channel } => {
                debug!(channel = %channel, "Subscription confirmed by transport");
            }
            ChannelStatus::Rejected { channel, reason } => {
                warn!(
                    channel = %channel,
                    tenant_id = %self.tenant_id(),
                    user_id = %self.user_id(),
                    reason = %reason,
                    "Subscription rejected by transport"
                );
                self.mark_error();
            }
            ChannelStatus::Closed { channel } => {
                let state = self.state();
                if state == ChannelState::Subscribed {
                    warn!(channel = %channel, "Transport dropped the channel");
                    self.mark_error();
                }
            }
        }
    }

    /// Tears the channel down. Terminal: releases the subscription before
    /// returning and refuses any further handshake.
    pub async fn close(&self) {
        let subscription = {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = ChannelState::Closed;
            inner.subscription.take()
        };

        if let Some(id) = subscription {
            if let Err(e) = self.transport.unsubscribe(id).await {
                warn!(channel = %self.channel_name(), error = %e, "Unsubscribe failed on close");
            }
        }

        info!(channel = %self.channel_name(), "Realtime channel closed");
    }

    fn mark_error(&self) {
        let mut inner = self.lock();
        if !inner.state.is_terminal() {
            inner.state = ChannelState::Error;
            inner.subscription = None;
            inner.retry_count += 1;
        }
    }
}
