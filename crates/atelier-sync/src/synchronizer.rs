//! Notification synchronizer — the session-level façade.
//!
//! One synchronizer per signed-in user session. It owns the store, the
//! fetch gateway, the channel manager, and the reconciler, and exposes a
//! small surface: `start`, `refresh`, `snapshot`, the optimistic mutation
//! calls, `retry_channel`, and `shutdown`.
//!
//! The two data paths degrade independently. A failed fetch leaves the
//! realtime channel working; a failed channel handshake leaves fetched
//! data on screen. Neither failure is ever allowed to panic or to poison
//! the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use atelier_core::AppError;
use atelier_core::AppResult;
use atelier_core::config::SyncConfig;
use atelier_core::traits::{EventSink, RealtimeTransport};
use atelier_core::types::credential::ChannelCredential;
use atelier_core::types::id::{NotificationId, TenantId, UserId};
use atelier_entity::NotificationRecord;

use crate::channel::manager::ChannelManager;
use crate::channel::state::ChannelState;
use crate::gateway::NotificationGateway;
use crate::reconcile::EventReconciler;
use crate::store::NotificationStore;

/// Point-in-time view of the session handed to the embedder.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    /// Visible records, newest first.
    pub records: Vec<NotificationRecord>,
    /// Unread counter, consistent with `records`.
    pub unread_count: u64,
    /// Whether an initial fetch or resync is in flight.
    pub is_loading: bool,
    /// Last fetch/resync failure, cleared by the next success.
    pub last_error: Option<AppError>,
    /// Current realtime channel lifecycle state.
    pub channel_state: ChannelState,
}

struct SyncCore {
    tenant_id: TenantId,
    user_id: UserId,
    config: SyncConfig,
    store: NotificationStore,
    gateway: Arc<dyn NotificationGateway>,
    manager: ChannelManager,
    reconciler: EventReconciler,
    /// Cleared on shutdown; gates every deferred store write.
    alive: AtomicBool,
    /// True while a fetch or resync is in flight.
    loading: AtomicBool,
    /// At most one rollback resync runs at a time.
    resync_inflight: AtomicBool,
    last_error: Mutex<Option<AppError>>,
    /// Event pump task for the current subscription.
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SyncCore {
    fn record_error(&self, error: AppError) {
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(error);
    }

    fn clear_error(&self) {
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        *last = None;
    }

    async fn fetch_into_store(&self, replace: bool) -> AppResult<()> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self
            .gateway
            .fetch_initial(self.tenant_id, self.user_id, self.config.fetch.initial_limit)
            .await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(batch) => {
                if self.alive.load(Ordering::SeqCst) {
                    if replace {
                        self.store.replace(batch.records, batch.unread_count);
                    } else {
                        self.store.initialize(batch.records, batch.unread_count);
                    }
                    self.clear_error();
                }
                Ok(())
            }
            Err(e) => {
                warn!(
                    tenant_id = %self.tenant_id,
                    user_id = %self.user_id,
                    error = %e,
                    "Notification fetch failed"
                );
                self.record_error(e.clone());
                Err(e)
            }
        }
    }

    /// Rollback after a failed optimistic mutation: refetch and let server
    /// truth overwrite the local edits. Collapses concurrent failures into
    /// one resync.
    async fn resync(&self) {
        if self.resync_inflight.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.alive.load(Ordering::SeqCst) {
            debug!(user_id = %self.user_id, "Resyncing after failed mutation");
            let _ = self.fetch_into_store(true).await;
        }
        self.resync_inflight.store(false, Ordering::SeqCst);
    }
}

/// Session-scoped notification synchronizer.
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct NotificationSynchronizer {
    inner: Arc<SyncCore>,
}

impl std::fmt::Debug for NotificationSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSynchronizer")
            .field("tenant_id", &self.inner.tenant_id)
            .field("user_id", &self.inner.user_id)
            .field("channel_state", &self.inner.manager.state())
            .finish()
    }
}

impl NotificationSynchronizer {
    /// Creates a synchronizer for one tenant/user session.
    pub fn new(
        config: SyncConfig,
        tenant_id: TenantId,
        user_id: UserId,
        gateway: Arc<dyn NotificationGateway>,
        transport: Arc<dyn RealtimeTransport>,
    ) -> Self {
        let manager = ChannelManager::new(transport, config.channel.clone(), tenant_id, user_id);
        Self {
            inner: Arc::new(SyncCore {
                tenant_id,
                user_id,
                config,
                store: NotificationStore::new(),
                gateway,
                manager,
                reconciler: EventReconciler::new(tenant_id, user_id),
                alive: AtomicBool::new(true),
                loading: AtomicBool::new(false),
                resync_inflight: AtomicBool::new(false),
                last_error: Mutex::new(None),
                pump: Mutex::new(None),
            }),
        }
    }

    /// Starts the session: initial fetch, then the channel handshake.
    ///
    /// The returned result reflects the fetch only. A channel failure is
    /// logged and left visible in [`SyncSnapshot::channel_state`]; fetched
    /// data keeps working without realtime updates.
    pub async fn start(&self, credential: &ChannelCredential) -> AppResult<()> {
        info!(
            tenant_id = %self.inner.tenant_id,
            user_id = %self.inner.user_id,
            "Starting notification session"
        );
        let fetched = self.inner.fetch_into_store(false).await;

        if let Err(e) = self.connect_channel(credential).await {
            warn!(
                channel = %self.inner.manager.channel_name(),
                error = %e,
                "Realtime channel unavailable; continuing on fetch data"
            );
        }

        fetched
    }

    /// Re-runs the initial fetch, merging into the current store state.
    pub async fn refresh(&self) -> AppResult<()> {
        self.inner.fetch_into_store(false).await
    }

    /// Attempts the channel handshake again after an error.
    ///
    /// Subject to the manager's backoff gating and retry budget; a fresh
    /// credential may be supplied if the previous one expired.
    pub async fn retry_channel(&self, credential: &ChannelCredential) -> AppResult<()> {
        self.connect_channel(credential).await
    }

    async fn connect_channel(&self, credential: &ChannelCredential) -> AppResult<()> {
        let (event_tx, mut event_rx) = mpsc::channel(self.inner.config.channel.event_buffer_size);
        let (status_tx, mut status_rx) = mpsc::channel(8);
        let sink = EventSink::new(event_tx, status_tx);

        // The current pump stays installed until the handshake has actually
        // subscribed the new sink: a redundant connect while live must not
        // retire the pump that is still receiving events. Events arriving
        // during the handshake buffer in the channel until the pump below
        // picks them up.
        let subscribed = self.inner.manager.connect(credential, sink).await?;
        if !subscribed {
            return Ok(());
        }

        let core = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_event = event_rx.recv() => match maybe_event {
                        Some(event) => {
                            if core.alive.load(Ordering::SeqCst) {
                                core.reconciler.apply(&core.store, &event);
                            }
                        }
                        None => break,
                    },
                    maybe_status = status_rx.recv() => match maybe_status {
                        Some(status) => core.manager.on_status(status),
                        None => break,
                    },
                }
            }
            debug!("Event pump stopped");
        });

        let mut pump = self.inner.pump.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = pump.replace(handle) {
            old.abort();
        }
        Ok(())
    }

    /// Returns the current session view.
    pub fn snapshot(&self) -> SyncSnapshot {
        let store = self.inner.store.snapshot();
        let last_error = self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        SyncSnapshot {
            records: store.records,
            unread_count: store.unread_count,
            is_loading: self.inner.loading.load(Ordering::SeqCst),
            last_error,
            channel_state: self.inner.manager.state(),
        }
    }

    /// Marks a notification read: applied locally at once, confirmed
    /// upstream in the background. A rejected confirmation triggers a full
    /// resync that rolls the local edit back to server truth.
    pub fn mark_read(&self, id: NotificationId) {
        self.inner.store.set_read_locally(id);
        let core = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = core.gateway.mark_read(id, core.user_id).await {
                warn!(notification_id = %id, error = %e, "mark_read rejected upstream");
                core.resync().await;
            }
        });
    }

    /// Records a click (implies read). Optimistic, like [`mark_read`].
    ///
    /// [`mark_read`]: Self::mark_read
    pub fn mark_clicked(&self, id: NotificationId) {
        self.inner.store.set_clicked_locally(id);
        let core = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = core.gateway.mark_clicked(id, core.user_id).await {
                warn!(notification_id = %id, error = %e, "mark_clicked rejected upstream");
                core.resync().await;
            }
        });
    }

    /// Removes a notification. Optimistic; the DELETE event echoed back by
    /// the channel lands on an already-empty slot and is a no-op.
    pub fn delete_notification(&self, id: NotificationId) {
        self.inner.store.remove(id);
        let core = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = core.gateway.delete(id, core.user_id).await {
                warn!(notification_id = %id, error = %e, "delete rejected upstream");
                core.resync().await;
            }
        });
    }

    /// Marks every notification read. Optimistic.
    pub fn mark_all_read(&self) {
        self.inner.store.set_all_read_locally();
        let core = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = core.gateway.mark_all_read(core.user_id).await {
                warn!(error = %e, "mark_all_read rejected upstream");
                core.resync().await;
            }
        });
    }

    /// Ends the session: stops applying events, closes the channel, and
    /// releases the subscription. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        self.inner.manager.close().await;

        let handle = {
            let mut pump = self.inner.pump.lock().unwrap_or_else(|e| e.into_inner());
            pump.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }

        info!(
            tenant_id = %self.inner.tenant_id,
            user_id = %self.inner.user_id,
            "Notification session shut down"
        );
    }
}
