//! In-memory notification store — the client-side source of truth.
//!
//! All operations are synchronous and total: a missing id is a no-op,
//! never an error. Unread-count deltas are always derived from the store's
//! own before/after view of a record, never from an event's implied delta,
//! which is what makes replayed events harmless.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use atelier_core::types::id::NotificationId;
use atelier_entity::NotificationRecord;

use super::snapshot::StoreSnapshot;

#[derive(Debug, Default)]
struct StoreInner {
    /// Visible records, kept sorted by `created_at` descending.
    records: Vec<NotificationRecord>,
    /// Unread counter. Seeded from the server on initialize, then
    /// maintained incrementally.
    unread: u64,
}

impl StoreInner {
    fn sort(&mut self) {
        self.records
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    fn position(&self, id: NotificationId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

/// Ordered collection of visible notification records plus the unread
/// counter. Single owner of truth on the client.
#[derive(Debug, Default)]
pub struct NotificationStore {
    inner: Mutex<StoreInner>,
}

impl NotificationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the store state from a fetch snapshot.
    ///
    /// Entries already present locally (buffered events, optimistic edits)
    /// are merged monotonically rather than blindly overwritten: a record
    /// the client already marked read or removed stays that way even if
    /// the snapshot predates the change. The server-supplied unread count
    /// is corrected for every record the merge flips.
    pub fn initialize(&self, records: Vec<NotificationRecord>, unread_count: u64) {
        let mut inner = self.lock();

        let mut local: HashMap<NotificationId, NotificationRecord> = inner
            .records
            .drain(..)
            .map(|r| (r.id, r))
            .collect();

        let mut unread = unread_count;
        let mut merged_records = Vec::with_capacity(records.len());

        for record in records {
            let counted_unread = record.is_unread();
            let merged = match local.remove(&record.id) {
                Some(mut existing) => {
                    existing.merge_from(record);
                    existing
                }
                None => record,
            };

            if counted_unread && !merged.is_unread() {
                unread = unread.saturating_sub(1);
            }
            if merged.is_active {
                merged_records.push(merged);
            }
        }

        // Records the snapshot does not know about yet (e.g. an INSERT that
        // arrived before the fetch completed) are kept, not dropped.
        for (_, record) in local {
            if record.is_active {
                if record.is_unread() {
                    unread += 1;
                }
                merged_records.push(record);
            }
        }

        inner.records = merged_records;
        inner.unread = unread;
        inner.sort();
    }

    /// Replaces the store wholesale with server truth, discarding all
    /// local state. Used for rollback after a failed optimistic mutation,
    /// where the local edits are exactly what must not survive.
    pub fn replace(&self, records: Vec<NotificationRecord>, unread_count: u64) {
        let mut inner = self.lock();
        inner.records = records.into_iter().filter(|r| r.is_active).collect();
        inner.unread = unread_count;
        inner.sort();
    }

    /// Inserts a record, or merges it into the existing entry with the
    /// same id. Never duplicates. A record whose merged state is inactive
    /// is dropped from view.
    pub fn upsert(&self, record: NotificationRecord) {
        let mut inner = self.lock();

        match inner.position(record.id) {
            Some(idx) => {
                let was_unread = inner.records[idx].is_unread();
                inner.records[idx].merge_from(record);

                if !inner.records[idx].is_active {
                    inner.records.remove(idx);
                    if was_unread {
                        inner.unread = inner.unread.saturating_sub(1);
                    }
                } else {
                    let now_unread = inner.records[idx].is_unread();
                    if was_unread && !now_unread {
                        inner.unread = inner.unread.saturating_sub(1);
                    } else if !was_unread && now_unread {
                        inner.unread += 1;
                    }
                }
            }
            None => {
                if !record.is_active {
                    return;
                }
                if record.is_unread() {
                    inner.unread += 1;
                }
                inner.records.push(record);
            }
        }

        inner.sort();
    }

    /// Drops a record if present. Decrements the unread counter once if
    /// the record was unread; floors at zero. Idempotent.
    pub fn remove(&self, id: NotificationId) {
        let mut inner = self.lock();
        if let Some(idx) = inner.position(id) {
            let was_unread = inner.records[idx].is_unread();
            inner.records.remove(idx);
            if was_unread {
                inner.unread = inner.unread.saturating_sub(1);
            }
        }
    }

    /// Marks a record read. Decrements the unread counter at most once per
    /// record; calling again is a no-op.
    pub fn set_read_locally(&self, id: NotificationId) {
        let mut inner = self.lock();
        if let Some(idx) = inner.position(id) {
            if inner.records[idx].is_read {
                return;
            }
            let was_unread = inner.records[idx].is_unread();
            inner.records[idx].is_read = true;
            if inner.records[idx].read_at.is_none() {
                inner.records[idx].read_at = Some(Utc::now());
            }
            if was_unread {
                inner.unread = inner.unread.saturating_sub(1);
            }
        }
    }

    /// Records a click on a notification. Clicking implies reading.
    pub fn set_clicked_locally(&self, id: NotificationId) {
        {
            let mut inner = self.lock();
            let Some(idx) = inner.position(id) else {
                return;
            };
            if inner.records[idx].clicked_at.is_none() {
                inner.records[idx].clicked_at = Some(Utc::now());
            }
        }
        self.set_read_locally(id);
    }

    /// Marks every visible record read and zeroes the unread counter.
    pub fn set_all_read_locally(&self) {
        let mut inner = self.lock();
        let now = Utc::now();
        for record in inner.records.iter_mut() {
            if !record.is_read {
                record.is_read = true;
                if record.read_at.is_none() {
                    record.read_at = Some(now);
                }
            }
        }
        inner.unread = 0;
    }

    /// Returns the current ordered list and unread count.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            records: inner.records.clone(),
            unread_count: inner.unread,
        }
    }

    /// Returns the number of visible records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Returns whether the store has no visible records.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::id::{TenantId, UserId};
    use chrono::{Duration, Utc};

    fn record(unread: bool) -> NotificationRecord {
        NotificationRecord {
            id: NotificationId::new(),
            tenant_id: TenantId::new(),
            user_id: UserId::new(),
            category: "booking".into(),
            title: "title".into(),
            message: "message".into(),
            payload: None,
            is_read: !unread,
            is_active: true,
            read_at: None,
            clicked_at: None,
            created_at: Utc::now(),
        }
    }

    fn counted_unread(store: &NotificationStore) -> u64 {
        store
            .snapshot()
            .records
            .iter()
            .filter(|r| r.is_unread())
            .count() as u64
    }

    #[test]
    fn test_initialize_empty() {
        let store = NotificationStore::new();
        store.initialize(vec![], 0);
        let snap = store.snapshot();
        assert!(snap.records.is_empty());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_unread_invariant_over_mixed_operations() {
        let store = NotificationStore::new();
        let a = record(true);
        let b = record(true);
        let c = record(false);
        store.initialize(vec![a.clone(), b.clone(), c.clone()], 2);

        store.set_read_locally(a.id);
        assert_eq!(store.snapshot().unread_count, counted_unread(&store));

        store.upsert(record(true));
        assert_eq!(store.snapshot().unread_count, counted_unread(&store));

        store.remove(b.id);
        assert_eq!(store.snapshot().unread_count, counted_unread(&store));

        store.set_all_read_locally();
        assert_eq!(store.snapshot().unread_count, 0);
        assert_eq!(counted_unread(&store), 0);
    }

    #[test]
    fn test_upsert_never_duplicates() {
        let store = NotificationStore::new();
        let a = record(true);
        store.upsert(a.clone());
        store.upsert(a.clone());
        let snap = store.snapshot();
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.unread_count, 1);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let store = NotificationStore::new();
        let a = record(true);
        store.upsert(a.clone());
        store.remove(a.id);
        store.remove(a.id);
        let snap = store.snapshot();
        assert!(snap.records.is_empty());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let store = NotificationStore::new();
        store.upsert(record(true));
        store.remove(NotificationId::new());
        assert_eq!(store.snapshot().unread_count, 1);
    }

    #[test]
    fn test_set_read_twice_decrements_once() {
        let store = NotificationStore::new();
        let a = record(true);
        let b = record(true);
        store.initialize(vec![a.clone(), b], 2);
        store.set_read_locally(a.id);
        store.set_read_locally(a.id);
        assert_eq!(store.snapshot().unread_count, 1);
    }

    #[test]
    fn test_clicked_implies_read() {
        let store = NotificationStore::new();
        let a = record(true);
        store.upsert(a.clone());
        store.set_clicked_locally(a.id);
        let snap = store.snapshot();
        assert!(snap.records[0].is_read);
        assert!(snap.records[0].clicked_at.is_some());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_upsert_inactive_removes_from_view() {
        let store = NotificationStore::new();
        let mut a = record(true);
        store.upsert(a.clone());
        a.is_active = false;
        store.upsert(a);
        let snap = store.snapshot();
        assert!(snap.records.is_empty());
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_upsert_unknown_inactive_is_noop() {
        let store = NotificationStore::new();
        let mut a = record(true);
        a.is_active = false;
        store.upsert(a);
        assert!(store.is_empty());
        assert_eq!(store.snapshot().unread_count, 0);
    }

    #[test]
    fn test_ordering_newest_first() {
        let store = NotificationStore::new();
        let mut old = record(false);
        old.created_at = Utc::now() - Duration::hours(2);
        let newer = record(false);
        store.initialize(vec![old.clone(), newer.clone()], 0);

        let mut newest = record(false);
        newest.created_at = Utc::now() + Duration::hours(1);
        store.upsert(newest.clone());

        let snap = store.snapshot();
        assert_eq!(snap.records[0].id, newest.id);
        assert_eq!(snap.records[2].id, old.id);
    }

    #[test]
    fn test_initialize_keeps_newer_local_state() {
        // An optimistic mark-read happened before the snapshot arrived;
        // the stale snapshot still says unread.
        let store = NotificationStore::new();
        let a = record(true);
        store.upsert(a.clone());
        store.set_read_locally(a.id);

        store.initialize(vec![a.clone()], 1);
        let snap = store.snapshot();
        assert!(snap.records[0].is_read);
        assert_eq!(snap.unread_count, 0);
    }

    #[test]
    fn test_initialize_keeps_buffered_insert() {
        // An INSERT event landed before the (older) fetch snapshot.
        let store = NotificationStore::new();
        let buffered = record(true);
        store.upsert(buffered.clone());

        let snapshot_only = record(true);
        store.initialize(vec![snapshot_only], 1);

        let snap = store.snapshot();
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.unread_count, 2);
        assert!(snap.records.iter().any(|r| r.id == buffered.id));
    }

    #[test]
    fn test_replace_discards_local_edits() {
        let store = NotificationStore::new();
        let a = record(true);
        store.initialize(vec![a.clone()], 1);
        store.set_read_locally(a.id);
        assert_eq!(store.snapshot().unread_count, 0);

        // Server truth still has the record unread; replace wins.
        store.replace(vec![a.clone()], 1);
        let snap = store.snapshot();
        assert!(!snap.records[0].is_read);
        assert_eq!(snap.unread_count, 1);
    }

    #[test]
    fn test_initialize_drops_locally_removed_record() {
        let store = NotificationStore::new();
        let mut a = record(true);
        store.upsert(a.clone());
        a.is_active = false;
        store.upsert(a.clone());

        a.is_active = true;
        a.is_read = false;
        store.initialize(vec![a.clone()], 1);
        // Once removed there is no local copy left to merge against, so a
        // snapshot that still contains the record brings it back. The
        // invariant must hold either way.
        let snap = store.snapshot();
        assert_eq!(snap.unread_count, snap.records.iter().filter(|r| r.is_unread()).count() as u64);
    }
}
