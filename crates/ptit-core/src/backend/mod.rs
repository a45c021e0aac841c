// ── Remote resource seams ──
//
// The orchestrator talks to these traits, never to HTTP directly.
// `HttpBackend` is the production implementation; `MemoryBackend`
// stands in for it in tests and offline demos.

use std::future::Future;

use crate::error::CoreError;
use crate::model::{Editable, EntityId, Listable, Role, Toggleable, User};

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{CallCounts, MemoryBackend};

/// Read side: fetch the full source collection.
pub trait ListBackend<T: Listable>: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<T>, CoreError>> + Send;
}

/// Create / update / delete for an editable resource.
pub trait ResourceBackend<T: Editable>: ListBackend<T> {
    /// Returns the server-confirmed record, including its new id.
    fn create(&self, draft: &T::Draft) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn update(
        &self,
        id: &EntityId,
        patch: &T::Patch,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn delete(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Enable / disable switch.
pub trait StatusBackend<T: Toggleable>: Send + Sync {
    fn set_active(
        &self,
        id: &EntityId,
        active: bool,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;
}

/// Grant or revoke the admin role.
pub trait RoleBackend: Send + Sync {
    fn change_role(
        &self,
        id: &EntityId,
        role: Role,
    ) -> impl Future<Output = Result<User, CoreError>> + Send;
}

pub trait NotificationBackend: Send + Sync {
    fn mark_read(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;
}
