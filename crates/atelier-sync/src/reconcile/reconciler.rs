//! Event reconciler — converts inbound channel events into store
//! mutations.
//!
//! The channel is already scoped per tenant/user by the transport, but
//! the reconciler re-checks ownership on every record as defense in
//! depth. Mismatches and malformed payloads are discarded silently (a
//! debug log, never an error): the feed must keep working on a noisy
//! channel.

use tracing::debug;

use atelier_core::events::ChangeEvent;
use atelier_core::types::id::{TenantId, UserId};

use crate::store::NotificationStore;

use super::extract;

/// Applies change events to the store for one session.
#[derive(Debug, Clone)]
pub struct EventReconciler {
    /// Session tenant.
    tenant_id: TenantId,
    /// Session user; events for anyone else are dropped.
    user_id: UserId,
}

impl EventReconciler {
    /// Creates a reconciler for a session scope.
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self { tenant_id, user_id }
    }

    /// Applies one event. Idempotent: replaying the same event twice
    /// leaves the store unchanged, because all unread deltas are derived
    /// inside the store from its own before/after record state.
    pub fn apply(&self, store: &NotificationStore, event: &ChangeEvent) {
        match event {
            ChangeEvent::Insert { payload } | ChangeEvent::Update { payload } => {
                let Some(record) = extract::record_from_payload(payload) else {
                    debug!(kind = event.kind_name(), "Discarding malformed event payload");
                    return;
                };
                if record.user_id != self.user_id || record.tenant_id != self.tenant_id {
                    debug!(
                        kind = event.kind_name(),
                        record_user = %record.user_id,
                        session_user = %self.user_id,
                        "Discarding event for foreign record"
                    );
                    return;
                }
                if record.is_active {
                    store.upsert(record);
                } else {
                    // Soft-delete via UPDATE is equivalent to removal.
                    store.remove(record.id);
                }
            }
            ChangeEvent::Delete { payload } => {
                let Some(id) = extract::id_from_payload(payload) else {
                    debug!(kind = "delete", "Discarding delete event without an id");
                    return;
                };
                store.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::id::NotificationId;
    use atelier_entity::NotificationRecord;
    use chrono::Utc;
    use serde_json::json;

    fn session() -> (TenantId, UserId) {
        (TenantId::new(), UserId::new())
    }

    fn record(tenant: TenantId, user: UserId, unread: bool) -> NotificationRecord {
        NotificationRecord {
            id: NotificationId::new(),
            tenant_id: tenant,
            user_id: user,
            category: "payment".into(),
            title: "Invoice paid".into(),
            message: String::new(),
            payload: None,
            is_read: !unread,
            is_active: true,
            read_at: None,
            clicked_at: None,
            created_at: Utc::now(),
        }
    }

    fn insert_event(record: &NotificationRecord) -> ChangeEvent {
        ChangeEvent::Insert {
            payload: serde_json::to_value(record).expect("serialize"),
        }
    }

    #[test]
    fn test_insert_applies_and_counts() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let rec = record(tenant, user, true);
        reconciler.apply(&store, &insert_event(&rec));

        let snap = store.snapshot();
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.unread_count, 1);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let rec = record(tenant, user, true);
        let event = insert_event(&rec);
        reconciler.apply(&store, &event);
        reconciler.apply(&store, &event);

        let snap = store.snapshot();
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.unread_count, 1);
    }

    #[test]
    fn test_foreign_user_discarded() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let foreign = record(tenant, UserId::new(), true);
        reconciler.apply(&store, &insert_event(&foreign));

        let snap = store.snapshot();
        assert!(snap.records.is_empty());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_foreign_tenant_discarded() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let foreign = record(TenantId::new(), user, true);
        reconciler.apply(&store, &insert_event(&foreign));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_to_inactive_removes() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let mut rec = record(tenant, user, true);
        reconciler.apply(&store, &insert_event(&rec));
        assert_eq!(store.snapshot().unread_count, 1);

        rec.is_active = false;
        let update = ChangeEvent::Update {
            payload: serde_json::to_value(&rec).expect("serialize"),
        };
        reconciler.apply(&store, &update);

        let snap = store.snapshot();
        assert!(snap.records.is_empty());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_update_unread_to_read_decrements_once() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let mut rec = record(tenant, user, true);
        reconciler.apply(&store, &insert_event(&rec));

        rec.is_read = true;
        rec.read_at = Some(Utc::now());
        let update = ChangeEvent::Update {
            payload: serde_json::to_value(&rec).expect("serialize"),
        };
        reconciler.apply(&store, &update);
        reconciler.apply(&store, &update);

        assert_eq!(store.snapshot().unread_count, 0);
    }

    #[test]
    fn test_stale_update_cannot_unread_a_read_record() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let mut rec = record(tenant, user, true);
        reconciler.apply(&store, &insert_event(&rec));
        store.set_read_locally(rec.id);

        // Out-of-order event still carrying the unread state.
        rec.is_read = false;
        let stale = ChangeEvent::Update {
            payload: serde_json::to_value(&rec).expect("serialize"),
        };
        reconciler.apply(&store, &stale);

        let snap = store.snapshot();
        assert!(snap.records[0].is_read);
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        let delete = ChangeEvent::Delete {
            payload: json!({"id": NotificationId::new()}),
        };
        reconciler.apply(&store, &delete);
        assert_eq!(store.snapshot().unread_count, 0);
    }

    #[test]
    fn test_malformed_payload_discarded() {
        let (tenant, user) = session();
        let reconciler = EventReconciler::new(tenant, user);
        let store = NotificationStore::new();

        reconciler.apply(
            &store,
            &ChangeEvent::Insert {
                payload: json!({"unexpected": "shape"}),
            },
        );
        reconciler.apply(
            &store,
            &ChangeEvent::Delete {
                payload: json!(17),
            },
        );
        assert!(store.is_empty());
    }
}
