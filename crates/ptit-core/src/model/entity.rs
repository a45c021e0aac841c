// ── Entity capability traits ──
//
// Each domain type declares which of its fields are searchable, which
// categorical keys it can be filtered by, and which payload fields are
// mandatory on create. The list controller and the CRUD orchestrator are
// generic over these traits.

use std::borrow::Cow;

use serde::Serialize;

use super::EntityId;

/// A record that can appear in a managed list.
pub trait Listable: Clone + Send + Sync + 'static {
    /// Human-readable entity name used in errors and logs (`"user"`).
    const ENTITY_TYPE: &'static str;

    /// The categorical keys accepted by `set_filter`.
    const FILTER_KEYS: &'static [&'static str];

    fn id(&self) -> &EntityId;

    /// Free-text fields matched by the search term. Absent values are skipped.
    fn search_fields(&self) -> Vec<&str>;

    /// The record's value for one of `FILTER_KEYS`, or `None` when unset.
    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// A create or update body sent to the backend.
///
/// `REQUIRED` names wire (camelCase) fields that must be present and
/// non-blank on create. On update, those same fields must not be blanked.
pub trait Payload: Serialize + Send + Sync {
    const REQUIRED: &'static [&'static str];
}

/// A record with typed create and update payloads.
pub trait Editable: Listable {
    type Draft: Payload;
    type Patch: Payload;

    /// Build the record a backend would return for `draft`.
    fn from_draft(id: EntityId, draft: &Self::Draft) -> Self;

    /// Merge the fields present in `patch`.
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// A record with an active / inactive switch.
pub trait Toggleable: Listable {
    fn is_active(&self) -> bool;

    #[must_use]
    fn with_active(self, active: bool) -> Self;
}
