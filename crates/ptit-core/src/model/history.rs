use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Listable;
use super::EntityId;

/// One line of the device activity log. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: EntityId,
    pub device: Option<String>,
    pub action: String,
    pub actor: Option<String>,
    pub detail: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Listable for HistoryEntry {
    const ENTITY_TYPE: &'static str = "history entry";
    const FILTER_KEYS: &'static [&'static str] = &["action"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(4);
        fields.extend(self.device.as_deref());
        fields.push(self.action.as_str());
        fields.extend(self.actor.as_deref());
        fields.extend(self.detail.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>> {
        (key == "action").then_some(Cow::Borrowed(self.action.as_str()))
    }
}
