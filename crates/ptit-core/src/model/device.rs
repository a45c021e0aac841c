use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity::{Editable, Listable, Payload, Toggleable};
use super::EntityId;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    #[default]
    Active,
    Inactive,
}

impl DeviceStatus {
    /// The backend reports `active`/`inactive`, older firmware `online`/`offline`.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("inactive" | "offline" | "disabled") => Self::Inactive,
            _ => Self::Active,
        }
    }
}

/// A registered IoT device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: EntityId,
    pub name: String,
    pub device_type: Option<String>,
    pub location: Option<String>,
    pub mac_address: Option<String>,
    pub status: DeviceStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Listable for Device {
    const ENTITY_TYPE: &'static str = "device";
    const FILTER_KEYS: &'static [&'static str] = &["device_type", "status"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.location.as_deref());
        fields.extend(self.mac_address.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "device_type" => self.device_type.as_deref().map(Cow::Borrowed),
            "status" => Some(Cow::Borrowed(self.status.as_ref())),
            _ => None,
        }
    }
}

impl Toggleable for Device {
    fn is_active(&self) -> bool {
        self.status == DeviceStatus::Active
    }

    fn with_active(mut self, active: bool) -> Self {
        self.status = if active {
            DeviceStatus::Active
        } else {
            DeviceStatus::Inactive
        };
        self
    }
}

// ── Payloads ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub name: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "mac")]
    pub mac_address: Option<String>,
}

impl Payload for NewDevice {
    const REQUIRED: &'static [&'static str] = &["name", "deviceType"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "mac")]
    pub mac_address: Option<String>,
}

impl Payload for DevicePatch {
    const REQUIRED: &'static [&'static str] = NewDevice::REQUIRED;
}

impl Editable for Device {
    type Draft = NewDevice;
    type Patch = DevicePatch;

    fn from_draft(id: EntityId, draft: &NewDevice) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            device_type: Some(draft.device_type.clone()),
            location: draft.location.clone(),
            mac_address: draft.mac_address.clone(),
            status: DeviceStatus::Active,
            created_at: Some(Utc::now()),
        }
    }

    fn apply_patch(&mut self, patch: &DevicePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if patch.device_type.is_some() {
            self.device_type.clone_from(&patch.device_type);
        }
        if patch.location.is_some() {
            self.location.clone_from(&patch.location);
        }
        if patch.mac_address.is_some() {
            self.mac_address.clone_from(&patch.mac_address);
        }
    }
}
