//! List management and CRUD orchestration for the PTIT IoT Platform admin
//! surface, sitting between `ptit-api` and UI consumers (the CLI).
//!
//! - **[`ListController`]**: search, categorical filters and pagination
//!   over an in-memory source snapshot. [`ListController::derive`] is a
//!   pure function of snapshot and [`ViewState`].
//!
//! - **[`CrudOrchestrator`]**: validates drafts and patches locally, calls
//!   a [`backend`] trait, tracks one [`OperationState`] per modal, and
//!   broadcasts an [`OperationEvent`] for every settled operation.
//!
//! - **[`EntityCollection`]**: the page-owned source collection. Keeps
//!   server order and publishes snapshots over a `watch` channel.
//!
//! - **[`ResourcePage`]**: wires one collection, controller and
//!   orchestrator together for a single entity type.
//!
//! - **Domain model** ([`model`]): `User`, `DeviceType`, `Device`,
//!   `HistoryEntry` and `Notification`, each declaring its searchable
//!   fields and filter keys through [`Listable`].

pub mod backend;
pub mod config;
pub mod convert;
pub mod crud;
pub mod error;
pub mod list;
pub mod model;
pub mod page;
pub mod report;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{
    HttpBackend, ListBackend, MemoryBackend, NotificationBackend, ResourceBackend, RoleBackend,
    StatusBackend,
};
pub use config::{ClientConfig, RoleChangeStrategy, TlsVerification};
pub use crud::{
    CrudOrchestrator, DeleteConfirmation, ImportReport, OperationError, OperationEvent,
    OperationKey, OperationKind, OperationPhase, OperationState, OperationTarget,
};
pub use error::{CoreError, ErrorKind};
pub use list::{FilterValue, ListController, PageSize, ViewState, VisiblePage};
pub use page::ResourcePage;
pub use report::{FacetReport, facet_counts};
pub use store::{EntityCollection, Snapshot};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccountStatus, Device, DevicePatch, DeviceStatus, DeviceType, DeviceTypePatch, Editable,
    EntityId, HistoryEntry, Listable, NewDevice, NewDeviceType, NewNotification, NewUser,
    Notification, NotificationLevel, NotificationPatch, Payload, Role, Toggleable, User,
    UserPatch,
};
