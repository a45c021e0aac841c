// ── Reactive source collection ──
//
// Order-preserving storage keyed by record id, with push-based change
// notification via `watch` channels. Server order is kept so the list
// view paginates in the same order the backend returned.

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::{EntityId, Listable};

/// Snapshot handed to list views. Cheap to clone.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// The source collection owned by one page.
///
/// Every mutation bumps a version counter and rebuilds the snapshot that
/// subscribers receive.
pub struct EntityCollection<T: Listable> {
    entries: Mutex<IndexMap<EntityId, Arc<T>>>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Listable> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Listable> EntityCollection<T> {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            entries: Mutex::new(IndexMap::new()),
            version,
            snapshot,
        }
    }

    /// Replace everything with a fresh list from the backend.
    ///
    /// Later duplicates of an id overwrite earlier ones in place.
    pub fn replace_all(&self, records: impl IntoIterator<Item = T>) {
        let mut entries = self.lock();
        entries.clear();
        for record in records {
            entries.insert(record.id().clone(), Arc::new(record));
        }
        self.publish(&entries);
    }

    /// Insert or update a record. Updates keep the record's position.
    /// Returns `true` if the id was new.
    pub fn upsert(&self, record: T) -> bool {
        let mut entries = self.lock();
        let is_new = entries
            .insert(record.id().clone(), Arc::new(record))
            .is_none();
        self.publish(&entries);
        is_new
    }

    /// Remove a record, preserving the order of the rest.
    pub fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let mut entries = self.lock();
        let removed = entries.shift_remove(id);
        if removed.is_some() {
            self.publish(&entries);
        }
        removed
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.lock().contains_key(id)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<EntityId, Arc<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the snapshot and broadcast it. Called with the lock held so
    /// snapshots are published in mutation order.
    fn publish(&self, entries: &IndexMap<EntityId, Arc<T>>) {
        let values: Vec<Arc<T>> = entries.values().cloned().collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DeviceType;

    fn dt(id: i64, name: &str) -> DeviceType {
        DeviceType {
            id: EntityId::Number(id),
            name: name.into(),
            description: None,
            manufacturer: None,
            category: None,
        }
    }

    fn names(col: &EntityCollection<DeviceType>) -> Vec<String> {
        col.snapshot().iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col = EntityCollection::new();
        assert!(col.upsert(dt(1, "Sensor")));
        assert!(!col.upsert(dt(1, "Sensor v2")));
        assert_eq!(col.len(), 1);
        assert_eq!(col.get(&EntityId::Number(1)).unwrap().name, "Sensor v2");
    }

    #[test]
    fn update_keeps_position_and_remove_keeps_order() {
        let col = EntityCollection::new();
        col.replace_all([dt(1, "a"), dt(2, "b"), dt(3, "c")]);

        col.upsert(dt(2, "B"));
        assert_eq!(names(&col), ["a", "B", "c"]);

        let removed = col.remove(&EntityId::Number(1));
        assert_eq!(removed.unwrap().name, "a");
        assert_eq!(names(&col), ["B", "c"]);
        assert!(col.remove(&EntityId::Number(1)).is_none());
    }

    #[test]
    fn version_bumps_only_on_change() {
        let col = EntityCollection::new();
        let v0 = col.version();
        col.upsert(dt(1, "a"));
        assert_eq!(col.version(), v0 + 1);

        col.remove(&EntityId::Number(99));
        assert_eq!(col.version(), v0 + 1);
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let col = EntityCollection::new();
        let mut rx = col.subscribe();

        col.upsert(dt(5, "Gateway"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
