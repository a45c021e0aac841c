// ── CRUD orchestrator ──
//
// Coordinates writes against a remote resource for one page: validates
// locally, calls the backend, tracks per-operation state, and folds the
// server-confirmed result back into the page's source collection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{StreamExt, stream};
use indexmap::IndexMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::operation::{
    OperationError, OperationEvent, OperationKey, OperationKind, OperationPhase, OperationState,
    OperationTarget,
};
use super::validate::{validate_draft, validate_patch};
use crate::backend::{ListBackend, NotificationBackend, ResourceBackend, RoleBackend, StatusBackend};
use crate::error::CoreError;
use crate::model::{Editable, EntityId, Listable, Notification, Role, Toggleable, User};
use crate::store::EntityCollection;

const EVENT_CHANNEL_SIZE: usize = 64;

/// Proof that the user was asked before a delete.
///
/// Only `CrudOrchestrator::request_delete` creates one, and
/// `submit_delete` consumes it.
#[derive(Debug)]
pub struct DeleteConfirmation {
    id: EntityId,
    entity_type: &'static str,
    label: Option<String>,
}

impl DeleteConfirmation {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// The question to put to the user.
    pub fn prompt(&self) -> String {
        match &self.label {
            Some(label) => format!("Delete {} {} ({label})?", self.entity_type, self.id),
            None => format!("Delete {} {}?", self.entity_type, self.id),
        }
    }
}

/// Outcome of a bulk create.
#[derive(Debug)]
pub struct ImportReport<T> {
    /// Created records with their input row, in row order.
    pub created: Vec<(usize, T)>,
    /// Failed rows, in row order.
    pub failed: Vec<(usize, CoreError)>,
}

/// Drives create, update, delete and domain actions for one entity type.
pub struct CrudOrchestrator<T: Listable, B> {
    backend: B,
    collection: Arc<EntityCollection<T>>,
    operations: Mutex<IndexMap<OperationKey, OperationState>>,
    events: broadcast::Sender<OperationEvent>,
    cancel: CancellationToken,
}

impl<T: Listable, B: ListBackend<T>> CrudOrchestrator<T, B> {
    pub fn new(backend: B, collection: Arc<EntityCollection<T>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            backend,
            collection,
            operations: Mutex::new(IndexMap::new()),
            events,
            cancel: CancellationToken::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn collection(&self) -> &Arc<EntityCollection<T>> {
        &self.collection
    }

    /// Subscribe to settled-operation notifications (toasts).
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.events.subscribe()
    }

    // ── Operation state ──────────────────────────────────────────────

    pub fn operation(&self, key: &OperationKey) -> Option<OperationState> {
        self.ops().get(key).cloned()
    }

    pub fn operations(&self) -> Vec<OperationState> {
        self.ops().values().cloned().collect()
    }

    pub fn is_submit_disabled(&self, key: &OperationKey) -> bool {
        self.ops().get(key).is_some_and(OperationState::is_submit_disabled)
    }

    /// The user changed a field after a failure: `Failed -> Idle`.
    /// Returns `false` if the operation was not in the failed phase.
    pub fn edit(&self, key: &OperationKey) -> bool {
        match self.ops().get_mut(key) {
            Some(state) if matches!(state.phase, OperationPhase::Failed(_)) => {
                state.phase = OperationPhase::Idle;
                true
            }
            _ => false,
        }
    }

    /// Modal closed: forget the operation. In-flight operations stay.
    pub fn dismiss(&self, key: &OperationKey) -> bool {
        let mut ops = self.ops();
        if ops.get(key).is_some_and(OperationState::is_submit_disabled) {
            return false;
        }
        ops.shift_remove(key).is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// The owner went away. Results of in-flight calls are dropped
    /// without touching state or the collection.
    pub fn detach(&self) {
        if !self.cancel.is_cancelled() {
            debug!(entity = T::ENTITY_TYPE, "orchestrator detached");
            self.cancel.cancel();
        }
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Reload the source collection from the backend. Returns the record count.
    pub async fn refresh(&self) -> Result<usize, CoreError> {
        if self.is_detached() {
            return Err(CoreError::Detached);
        }
        let records = self.backend.list().await?;
        if self.is_detached() {
            debug!(entity = T::ENTITY_TYPE, "discarding refresh: detached");
            return Err(CoreError::Detached);
        }
        let count = records.len();
        self.collection.replace_all(records);
        debug!(entity = T::ENTITY_TYPE, count, "collection refreshed");
        Ok(count)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn ops(&self) -> MutexGuard<'_, IndexMap<OperationKey, OperationState>> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `Idle | Succeeded | Failed -> Submitting`, refusing duplicates.
    fn begin(&self, key: &OperationKey) -> Result<(), CoreError> {
        if self.is_detached() {
            return Err(CoreError::Detached);
        }
        let mut ops = self.ops();
        if ops.get(key).is_some_and(OperationState::is_submit_disabled) {
            return Err(CoreError::OperationInFlight {
                kind: key.kind,
                target: format!("{} {}", T::ENTITY_TYPE, key.target),
            });
        }
        ops.insert(
            key.clone(),
            OperationState {
                key: key.clone(),
                phase: OperationPhase::Submitting,
            },
        );
        drop(ops);
        debug!(entity = T::ENTITY_TYPE, kind = %key.kind, target = %key.target, "submitting");
        Ok(())
    }

    /// Settle a remote result: apply it to the collection on success and
    /// record the outcome. Dropped entirely once detached.
    fn finish<R>(
        &self,
        key: &OperationKey,
        result: Result<R, CoreError>,
        apply: impl FnOnce(&R),
    ) -> Result<R, CoreError> {
        if self.is_detached() {
            debug!(entity = T::ENTITY_TYPE, kind = %key.kind, target = %key.target,
                "discarding result: detached");
            return Err(CoreError::Detached);
        }
        match result {
            Ok(value) => {
                apply(&value);
                self.settle(key, None);
                Ok(value)
            }
            Err(err) => {
                self.settle(key, Some(&err));
                Err(err)
            }
        }
    }

    fn settle(&self, key: &OperationKey, error: Option<&CoreError>) {
        let error = error.map(|err| {
            warn!(entity = T::ENTITY_TYPE, kind = %key.kind, target = %key.target,
                error = %err, "operation failed");
            OperationError::from(err)
        });
        if error.is_none() {
            info!(entity = T::ENTITY_TYPE, kind = %key.kind, target = %key.target,
                "operation succeeded");
        }

        if let Some(state) = self.ops().get_mut(key) {
            state.phase = match &error {
                None => OperationPhase::Succeeded,
                Some(err) => OperationPhase::Failed(err.clone()),
            };
        }

        // No receivers is fine: nobody is showing toasts.
        let _ = self.events.send(OperationEvent {
            entity_type: T::ENTITY_TYPE,
            key: key.clone(),
            error,
        });
    }
}

// ── Create / update / delete ────────────────────────────────────────

impl<T: Editable, B: ResourceBackend<T>> CrudOrchestrator<T, B> {
    /// Validate and create. On success the server's record is appended
    /// to the collection.
    pub async fn submit_create(&self, draft: &T::Draft) -> Result<T, CoreError> {
        self.create_as(OperationTarget::New, draft).await
    }

    /// Validate and update record `id`. The server's copy replaces the
    /// local one.
    pub async fn submit_update(&self, id: &EntityId, patch: &T::Patch) -> Result<T, CoreError> {
        let key = OperationKey::new(OperationKind::Update, id.clone());
        self.begin(&key)?;
        if let Err(err) = validate_patch(patch) {
            self.settle(&key, Some(&err));
            return Err(err);
        }
        let result = self.backend.update(id, patch).await;
        self.finish(&key, result, |record| {
            self.collection.upsert(record.clone());
        })
    }

    /// First half of a delete: produce the confirmation to show the user.
    pub fn request_delete(&self, id: &EntityId) -> DeleteConfirmation {
        let label = self
            .collection
            .get(id)
            .and_then(|record| record.search_fields().first().map(|s| (*s).to_owned()));
        DeleteConfirmation {
            id: id.clone(),
            entity_type: T::ENTITY_TYPE,
            label,
        }
    }

    /// Second half of a delete. A record the server no longer has is
    /// reported as `NotFound` and dropped from the local collection too.
    pub async fn submit_delete(&self, confirmation: DeleteConfirmation) -> Result<(), CoreError> {
        let id = confirmation.id;
        let key = OperationKey::new(OperationKind::Delete, id.clone());
        self.begin(&key)?;
        let result = self.backend.delete(&id).await;
        let outcome = self.finish(&key, result, |_| {
            self.collection.remove(&id);
        });
        if let Err(CoreError::NotFound { .. }) = &outcome {
            self.collection.remove(&id);
        }
        outcome
    }

    /// Create many records with at most `concurrency` requests in flight.
    ///
    /// `on_settled` runs once per row as results arrive.
    pub async fn import(
        &self,
        drafts: &[T::Draft],
        concurrency: usize,
        mut on_settled: impl FnMut(usize, Result<&T, &CoreError>),
    ) -> ImportReport<T> {
        let mut results = stream::iter(drafts.iter().enumerate())
            .map(|(row, draft)| async move {
                (row, self.create_as(OperationTarget::Row(row), draft).await)
            })
            .buffer_unordered(concurrency.max(1));

        let mut report = ImportReport {
            created: Vec::new(),
            failed: Vec::new(),
        };
        while let Some((row, result)) = results.next().await {
            on_settled(row, result.as_ref());
            match result {
                Ok(record) => report.created.push((row, record)),
                Err(err) => report.failed.push((row, err)),
            }
        }
        drop(results);

        report.created.sort_by_key(|(row, _)| *row);
        report.failed.sort_by_key(|(row, _)| *row);

        // Succeeded rows have no modal to close.
        for (row, _) in &report.created {
            self.dismiss(&OperationKey::new(OperationKind::Create, OperationTarget::Row(*row)));
        }
        info!(
            entity = T::ENTITY_TYPE,
            created = report.created.len(),
            failed = report.failed.len(),
            "import finished"
        );
        report
    }

    async fn create_as(&self, target: OperationTarget, draft: &T::Draft) -> Result<T, CoreError> {
        let key = OperationKey::new(OperationKind::Create, target);
        self.begin(&key)?;
        if let Err(err) = validate_draft(draft) {
            self.settle(&key, Some(&err));
            return Err(err);
        }
        let result = self.backend.create(draft).await;
        self.finish(&key, result, |record| {
            self.collection.upsert(record.clone());
        })
    }
}

// ── Domain actions ──────────────────────────────────────────────────

impl<T: Toggleable, B: StatusBackend<T> + ListBackend<T>> CrudOrchestrator<T, B> {
    /// Flip the active flag. Sends the inverse of `currently_active` and
    /// keeps whatever the server returns.
    pub async fn submit_status_toggle(
        &self,
        id: &EntityId,
        currently_active: bool,
    ) -> Result<T, CoreError> {
        let key = OperationKey::new(OperationKind::StatusToggle, id.clone());
        self.begin(&key)?;
        let result = self.backend.set_active(id, !currently_active).await;
        self.finish(&key, result, |record| {
            self.collection.upsert(record.clone());
        })
    }
}

impl<B: RoleBackend + ListBackend<User>> CrudOrchestrator<User, B> {
    pub async fn submit_role_change(&self, id: &EntityId, role: Role) -> Result<User, CoreError> {
        let key = OperationKey::new(OperationKind::RoleChange, id.clone());
        self.begin(&key)?;
        let result = self.backend.change_role(id, role).await;
        self.finish(&key, result, |user| {
            self.collection.upsert(user.clone());
        })
    }
}

impl<B: NotificationBackend + ListBackend<Notification>> CrudOrchestrator<Notification, B> {
    pub async fn submit_mark_read(&self, id: &EntityId) -> Result<(), CoreError> {
        let key = OperationKey::new(OperationKind::MarkRead, id.clone());
        self.begin(&key)?;
        let result = self.backend.mark_read(id).await;
        self.finish(&key, result, |_| {
            if let Some(current) = self.collection.get(id) {
                let mut updated = (*current).clone();
                updated.read = true;
                self.collection.upsert(updated);
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::ErrorKind;
    use crate::model::{
        AccountStatus, DeviceType, DeviceTypePatch, NewDeviceType, NotificationLevel,
    };

    fn device_type(id: i64, name: &str) -> DeviceType {
        DeviceType {
            id: EntityId::Number(id),
            name: name.into(),
            description: None,
            manufacturer: None,
            category: Some("sensor".into()),
        }
    }

    async fn orchestrator(
        seed: Vec<DeviceType>,
    ) -> CrudOrchestrator<DeviceType, MemoryBackend<DeviceType>> {
        let orch = CrudOrchestrator::new(
            MemoryBackend::new(seed),
            Arc::new(EntityCollection::new()),
        );
        orch.refresh().await.unwrap();
        orch
    }

    fn ids(orch: &CrudOrchestrator<DeviceType, MemoryBackend<DeviceType>>) -> Vec<i64> {
        orch.collection()
            .snapshot()
            .iter()
            .filter_map(|t| t.id.as_number())
            .collect()
    }

    // ── Delete ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_then_delete_again_is_not_found() {
        let orch = orchestrator((5..=8).map(|i| device_type(i, "t")).collect()).await;
        let seven = EntityId::Number(7);

        let confirmation = orch.request_delete(&seven);
        assert_eq!(confirmation.prompt(), "Delete device type 7 (t)?");
        orch.submit_delete(confirmation).await.unwrap();
        assert_eq!(ids(&orch), vec![5, 6, 8]);

        orch.refresh().await.unwrap();
        assert_eq!(ids(&orch), vec![5, 6, 8]);

        let err = orch
            .submit_delete(orch.request_delete(&seven))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref identifier, .. } if identifier == "7"));

        let state = orch
            .operation(&OperationKey::new(OperationKind::Delete, seven))
            .unwrap();
        assert_eq!(state.last_error().unwrap().kind, ErrorKind::NotFound);
    }

    // ── Validation ───────────────────────────────────────────────────

    #[tokio::test]
    async fn invalid_create_never_reaches_backend() {
        let orch = orchestrator(vec![]).await;
        let before = orch.backend().calls();

        let err = orch
            .submit_create(&NewDeviceType {
                name: String::new(),
                ..NewDeviceType::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(orch.backend().calls(), before);
        assert_eq!(orch.backend().calls().create, 0);

        let key = OperationKey::new(OperationKind::Create, OperationTarget::New);
        let state = orch.operation(&key).unwrap();
        assert_eq!(state.last_error().unwrap().message, "name is required");

        assert!(orch.edit(&key));
        assert_eq!(orch.operation(&key).unwrap().phase, OperationPhase::Idle);
        assert!(!orch.edit(&key));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_locally() {
        let orch = orchestrator(vec![device_type(1, "Sensor")]).await;
        let err = orch
            .submit_update(&EntityId::Number(1), &DeviceTypePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(orch.backend().calls().update, 0);
    }

    // ── Happy paths ──────────────────────────────────────────────────

    #[tokio::test]
    async fn create_appends_server_record() {
        let orch = orchestrator(vec![device_type(3, "Sensor")]).await;
        let mut events = orch.subscribe();

        let created = orch
            .submit_create(&NewDeviceType {
                name: "Gateway".into(),
                ..NewDeviceType::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, EntityId::Number(4));
        assert_eq!(ids(&orch), vec![3, 4]);

        let event = events.recv().await.unwrap();
        assert!(event.is_success());
        assert_eq!(event.to_string(), "device type new record created");
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let orch = orchestrator(vec![device_type(1, "a"), device_type(2, "b")]).await;
        orch.submit_update(
            &EntityId::Number(1),
            &DeviceTypePatch {
                name: Some("A".into()),
                ..DeviceTypePatch::default()
            },
        )
        .await
        .unwrap();

        let names: Vec<String> = orch
            .collection()
            .snapshot()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["A", "b"]);
    }

    #[tokio::test]
    async fn status_toggle_sends_inverse() {
        let user = User {
            id: EntityId::Number(9),
            username: "lan".into(),
            full_name: None,
            email: None,
            role: Role::User,
            status: AccountStatus::Active,
            created_at: None,
        };
        let orch = CrudOrchestrator::new(
            MemoryBackend::new([user]),
            Arc::new(EntityCollection::new()),
        );
        orch.refresh().await.unwrap();

        let updated = orch
            .submit_status_toggle(&EntityId::Number(9), true)
            .await
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Disabled);

        let promoted = orch
            .submit_role_change(&EntityId::Number(9), Role::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(
            orch.collection().get(&EntityId::Number(9)).unwrap().role,
            Role::Admin
        );
    }

    #[tokio::test]
    async fn mark_read_updates_local_copy() {
        let note = Notification {
            id: EntityId::Number(1),
            title: "Battery low".into(),
            message: None,
            level: NotificationLevel::Warning,
            read: false,
            created_at: None,
        };
        let orch = CrudOrchestrator::new(
            MemoryBackend::new([note]),
            Arc::new(EntityCollection::new()),
        );
        orch.refresh().await.unwrap();

        orch.submit_mark_read(&EntityId::Number(1)).await.unwrap();
        assert!(orch.collection().get(&EntityId::Number(1)).unwrap().read);
    }

    // ── Failures ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn remote_failure_is_recorded_not_retried() {
        let orch = orchestrator(vec![device_type(1, "a")]).await;
        orch.backend().fail_next(CoreError::RemoteRejected {
            status: 409,
            message: "name already exists".into(),
            code: None,
        });

        let draft = NewDeviceType {
            name: "a".into(),
            ..NewDeviceType::default()
        };
        let err = orch.submit_create(&draft).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert_eq!(orch.backend().calls().create, 1);

        let key = OperationKey::new(OperationKind::Create, OperationTarget::New);
        let state = orch.operation(&key).unwrap();
        assert!(!state.is_submit_disabled());
        assert_eq!(state.last_error().unwrap().message, "name already exists");
        assert_eq!(ids(&orch), vec![1]);

        assert!(orch.dismiss(&key));
        assert!(orch.operation(&key).is_none());
    }

    #[tokio::test]
    async fn network_failure_uses_generic_message() {
        let orch = orchestrator(vec![device_type(1, "a")]).await;
        orch.backend().fail_next(CoreError::Network {
            message: "connection refused".into(),
        });

        orch.submit_delete(orch.request_delete(&EntityId::Number(1)))
            .await
            .unwrap_err();

        let state = orch
            .operation(&OperationKey::new(OperationKind::Delete, EntityId::Number(1)))
            .unwrap();
        assert_eq!(
            state.last_error().unwrap().message,
            crate::error::CONNECTIVITY_MESSAGE
        );
        assert_eq!(ids(&orch), vec![1]);
    }

    // ── Concurrency ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn duplicate_submit_is_refused_while_in_flight() {
        let orch = CrudOrchestrator::new(
            MemoryBackend::new([device_type(1, "a")]).with_latency(Duration::from_millis(100)),
            Arc::new(EntityCollection::new()),
        );
        let id = EntityId::Number(1);
        let key = OperationKey::new(OperationKind::Delete, id.clone());

        let (first, second) = tokio::join!(
            orch.submit_delete(orch.request_delete(&id)),
            async {
                tokio::task::yield_now().await;
                assert!(orch.is_submit_disabled(&key));
                orch.submit_delete(orch.request_delete(&id)).await
            }
        );

        first.unwrap();
        assert!(matches!(second, Err(CoreError::OperationInFlight { .. })));
        assert_eq!(orch.backend().calls().delete, 1);
        assert!(!orch.is_submit_disabled(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn detached_results_are_discarded() {
        let orch = CrudOrchestrator::new(
            MemoryBackend::new(Vec::<DeviceType>::new()).with_latency(Duration::from_millis(100)),
            Arc::new(EntityCollection::new()),
        );
        let mut events = orch.subscribe();
        let draft = NewDeviceType {
            name: "Gateway".into(),
            ..NewDeviceType::default()
        };

        let (result, ()) = tokio::join!(orch.submit_create(&draft), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orch.detach();
        });

        assert!(matches!(result, Err(CoreError::Detached)));
        assert!(orch.collection().is_empty());
        assert!(events.try_recv().is_err());
        assert!(matches!(
            orch.submit_create(&draft).await,
            Err(CoreError::Detached)
        ));
    }

    #[tokio::test]
    async fn import_reports_rows_in_order() {
        let orch = orchestrator(vec![]).await;
        let drafts: Vec<NewDeviceType> = ["Sensor", "", "Gateway", "Camera"]
            .into_iter()
            .map(|name| NewDeviceType {
                name: name.into(),
                ..NewDeviceType::default()
            })
            .collect();

        let mut settled = 0;
        let report = orch.import(&drafts, 2, |_, _| settled += 1).await;

        assert_eq!(settled, 4);
        let created_rows: Vec<usize> = report.created.iter().map(|(row, _)| *row).collect();
        assert_eq!(created_rows, vec![0, 2, 3]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        assert_eq!(orch.collection().len(), 3);
        assert_eq!(orch.backend().calls().create, 3);

        // Only the failed row keeps an operation state.
        let remaining: Vec<OperationTarget> =
            orch.operations().into_iter().map(|s| s.key.target).collect();
        assert_eq!(remaining, vec![OperationTarget::Row(1)]);
    }
}
