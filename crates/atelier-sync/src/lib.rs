//! # atelier-sync
//!
//! Client-side realtime notification synchronizer for Atelier. Provides:
//!
//! - An in-memory notification store with an always-consistent unread count
//! - A channel manager driving the authenticate/subscribe lifecycle with
//!   credential verification, timeouts, and backoff-gated retry
//! - An event reconciler that applies INSERT/UPDATE/DELETE events
//!   idempotently and discards records not owned by the session
//! - Optimistic mark-read/mark-clicked/delete with full-resync rollback
//! - An in-memory transport for single-process use and tests

pub mod channel;
pub mod gateway;
pub mod reconcile;
pub mod store;
pub mod synchronizer;
pub mod transport;

pub use channel::manager::ChannelManager;
pub use channel::state::ChannelState;
pub use gateway::NotificationGateway;
pub use reconcile::reconciler::EventReconciler;
pub use store::store::NotificationStore;
pub use synchronizer::{NotificationSynchronizer, SyncSnapshot};
pub use transport::memory::MemoryTransport;
