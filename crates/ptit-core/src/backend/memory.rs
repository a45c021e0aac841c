// In-process backend with call accounting and failure injection.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;

use super::{ListBackend, NotificationBackend, ResourceBackend, RoleBackend, StatusBackend};
use crate::error::CoreError;
use crate::model::{Editable, EntityId, Listable, Notification, Role, Toggleable, User};

/// Number of calls each backend method has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub action: usize,
}

impl CallCounts {
    /// Every call that would have hit the network.
    pub fn total(&self) -> usize {
        self.list + self.create + self.update + self.delete + self.action
    }
}

#[derive(Default)]
struct Counters {
    list: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    action: AtomicUsize,
}

/// A `ResourceBackend` that keeps records in memory.
///
/// Ids are assigned sequentially after the largest numeric seed id.
pub struct MemoryBackend<T: Listable> {
    records: Mutex<IndexMap<EntityId, T>>,
    next_id: AtomicI64,
    counters: Counters,
    fail_next: Mutex<Option<CoreError>>,
    latency: Option<Duration>,
}

impl<T: Listable> MemoryBackend<T> {
    pub fn new(seed: impl IntoIterator<Item = T>) -> Self {
        let records: IndexMap<EntityId, T> =
            seed.into_iter().map(|r| (r.id().clone(), r)).collect();
        let max_id = records
            .keys()
            .filter_map(EntityId::as_number)
            .max()
            .unwrap_or(0);

        Self {
            records: Mutex::new(records),
            next_id: AtomicI64::new(max_id + 1),
            counters: Counters::default(),
            fail_next: Mutex::new(None),
            latency: None,
        }
    }

    /// Delay every call, to observe the `Submitting` phase.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with `err` instead of touching the records.
    pub fn fail_next(&self, err: CoreError) {
        *self.fail_next.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.counters.list.load(Ordering::Relaxed),
            create: self.counters.create.load(Ordering::Relaxed),
            update: self.counters.update.load(Ordering::Relaxed),
            delete: self.counters.delete.load(Ordering::Relaxed),
            action: self.counters.action.load(Ordering::Relaxed),
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn records(&self) -> std::sync::MutexGuard<'_, IndexMap<EntityId, T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out the latency, then consume any injected failure.
    async fn enter(&self, counter: &AtomicUsize) -> Result<(), CoreError> {
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        injected.map_or(Ok(()), Err)
    }

    fn missing(id: &EntityId) -> CoreError {
        CoreError::NotFound {
            entity_type: T::ENTITY_TYPE.to_owned(),
            identifier: id.to_string(),
            message: None,
        }
    }

    fn modify<R>(&self, id: &EntityId, f: impl FnOnce(&mut T) -> R) -> Result<R, CoreError> {
        self.records()
            .get_mut(id)
            .map(f)
            .ok_or_else(|| Self::missing(id))
    }
}

impl<T: Listable> ListBackend<T> for MemoryBackend<T> {
    async fn list(&self) -> Result<Vec<T>, CoreError> {
        self.enter(&self.counters.list).await?;
        Ok(self.records().values().cloned().collect())
    }
}

impl<T: Editable> ResourceBackend<T> for MemoryBackend<T> {
    async fn create(&self, draft: &T::Draft) -> Result<T, CoreError> {
        self.enter(&self.counters.create).await?;
        let id = EntityId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = T::from_draft(id.clone(), draft);
        self.records().insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &EntityId, patch: &T::Patch) -> Result<T, CoreError> {
        self.enter(&self.counters.update).await?;
        self.modify(id, |record| {
            record.apply_patch(patch);
            record.clone()
        })
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.enter(&self.counters.delete).await?;
        self.records()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::missing(id))
    }
}

impl<T: Toggleable> StatusBackend<T> for MemoryBackend<T> {
    async fn set_active(&self, id: &EntityId, active: bool) -> Result<T, CoreError> {
        self.enter(&self.counters.action).await?;
        self.modify(id, |record| {
            *record = record.clone().with_active(active);
            record.clone()
        })
    }
}

impl RoleBackend for MemoryBackend<User> {
    async fn change_role(&self, id: &EntityId, role: Role) -> Result<User, CoreError> {
        self.enter(&self.counters.action).await?;
        self.modify(id, |user| {
            user.role = role;
            user.clone()
        })
    }
}

impl NotificationBackend for MemoryBackend<Notification> {
    async fn mark_read(&self, id: &EntityId) -> Result<(), CoreError> {
        self.enter(&self.counters.action).await?;
        self.modify(id, |n| n.read = true)
    }
}
