// ── API-to-domain type conversions ──
//
// Bridges raw `ptit_api::types` responses into `ptit_core::model` records.
// Each `From` impl parses role and status strings into strong types and
// fills defaults for fields older endpoints leave out.

use ptit_api::types::{
    DeviceResponse, DeviceTypeResponse, HistoryEntryResponse, NotificationResponse, UserResponse,
};

use crate::model::{
    AccountStatus, Device, DeviceStatus, DeviceType, HistoryEntry, Notification,
    NotificationLevel, Role, User,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Blank strings from the backend count as absent.
fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

fn account_status(status: Option<&str>, enabled: Option<bool>) -> AccountStatus {
    if let Some(raw) = status {
        return match raw.to_ascii_lowercase().as_str() {
            "disabled" | "inactive" | "locked" | "blocked" => AccountStatus::Disabled,
            _ => AccountStatus::Active,
        };
    }
    match enabled {
        Some(false) => AccountStatus::Disabled,
        _ => AccountStatus::Active,
    }
}

// ── Conversions ────────────────────────────────────────────────────

impl From<UserResponse> for User {
    fn from(u: UserResponse) -> Self {
        Self {
            id: u.id.into(),
            role: u
                .role
                .as_deref()
                .and_then(|r| r.parse::<Role>().ok())
                .unwrap_or_default(),
            status: account_status(u.status.as_deref(), u.enabled),
            username: u.username,
            full_name: non_blank(u.full_name),
            email: non_blank(u.email),
            created_at: u.created_at,
        }
    }
}

impl From<DeviceTypeResponse> for DeviceType {
    fn from(t: DeviceTypeResponse) -> Self {
        Self {
            id: t.id.into(),
            name: t.name,
            description: non_blank(t.description),
            manufacturer: non_blank(t.manufacturer),
            category: non_blank(t.category),
        }
    }
}

impl From<DeviceResponse> for Device {
    fn from(d: DeviceResponse) -> Self {
        Self {
            id: d.id.into(),
            status: DeviceStatus::from_wire(d.status.as_deref()),
            name: d.name,
            device_type: non_blank(d.device_type),
            location: non_blank(d.location),
            mac_address: non_blank(d.mac_address),
            created_at: d.created_at,
        }
    }
}

impl From<HistoryEntryResponse> for HistoryEntry {
    fn from(h: HistoryEntryResponse) -> Self {
        Self {
            id: h.id.into(),
            device: non_blank(h.device),
            action: h.action,
            actor: non_blank(h.actor),
            detail: non_blank(h.detail),
            timestamp: h.timestamp,
        }
    }
}

impl From<NotificationResponse> for Notification {
    fn from(n: NotificationResponse) -> Self {
        Self {
            id: n.id.into(),
            level: n
                .level
                .as_deref()
                .and_then(|l| match l.to_ascii_lowercase().as_str() {
                    "error" | "danger" => Some(NotificationLevel::Critical),
                    "warn" => Some(NotificationLevel::Warning),
                    other => other.parse().ok(),
                })
                .unwrap_or_default(),
            title: n.title,
            message: non_blank(n.message),
            read: n.read,
            created_at: n.created_at,
        }
    }
}
