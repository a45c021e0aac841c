use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity::{Editable, Listable, Payload};
use super::EntityId;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: EntityId,
    pub title: String,
    pub message: Option<String>,
    pub level: NotificationLevel,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Listable for Notification {
    const ENTITY_TYPE: &'static str = "notification";
    const FILTER_KEYS: &'static [&'static str] = &["level", "read"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.message.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "level" => Some(Cow::Borrowed(self.level.as_ref())),
            "read" => Some(Cow::Borrowed(if self.read { "true" } else { "false" })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<NotificationLevel>,
}

impl Payload for NewNotification {
    const REQUIRED: &'static [&'static str] = &["title"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<NotificationLevel>,
}

impl Payload for NotificationPatch {
    const REQUIRED: &'static [&'static str] = NewNotification::REQUIRED;
}

impl Editable for Notification {
    type Draft = NewNotification;
    type Patch = NotificationPatch;

    fn from_draft(id: EntityId, draft: &NewNotification) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            message: draft.message.clone(),
            level: draft.level.unwrap_or_default(),
            read: false,
            created_at: Some(Utc::now()),
        }
    }

    fn apply_patch(&mut self, patch: &NotificationPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if patch.message.is_some() {
            self.message.clone_from(&patch.message);
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
    }
}
