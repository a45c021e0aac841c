use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::entity::{Editable, Listable, Payload};
use super::EntityId;

/// A catalogue entry describing a kind of device (sensor, gateway, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceType {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
}

impl Listable for DeviceType {
    const ENTITY_TYPE: &'static str = "device type";
    const FILTER_KEYS: &'static [&'static str] = &["category"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.manufacturer.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "category" => self.category.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeviceType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Payload for NewDeviceType {
    const REQUIRED: &'static [&'static str] = &["name"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Payload for DeviceTypePatch {
    const REQUIRED: &'static [&'static str] = NewDeviceType::REQUIRED;
}

impl Editable for DeviceType {
    type Draft = NewDeviceType;
    type Patch = DeviceTypePatch;

    fn from_draft(id: EntityId, draft: &NewDeviceType) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            manufacturer: draft.manufacturer.clone(),
            category: draft.category.clone(),
        }
    }

    fn apply_patch(&mut self, patch: &DeviceTypePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if patch.description.is_some() {
            self.description.clone_from(&patch.description);
        }
        if patch.manufacturer.is_some() {
            self.manufacturer.clone_from(&patch.manufacturer);
        }
        if patch.category.is_some() {
            self.category.clone_from(&patch.category);
        }
    }
}
