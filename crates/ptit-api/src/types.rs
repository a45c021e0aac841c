// Wire types for the PTIT IoT Platform REST backend.
//
// Field names follow the backend's camelCase JSON. Optional fields are
// lenient: older endpoints omit them entirely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────

/// Record identifier as sent by the backend: numeric (MySQL auto-increment)
/// or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Envelopes ───────────────────────────────────────────────────────

/// List bodies arrive either as a bare array or wrapped in `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(v) | Self::Wrapped { data: v } => v,
        }
    }
}

/// Single-record bodies, optionally wrapped in `{"data": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemBody<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemBody<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data: v } | Self::Bare(v) => v,
        }
    }
}

/// Error body shape: `{"message": "...", "code": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: ApiId,
    pub username: String,
    #[serde(default, alias = "fullname", alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Role name, e.g. `"admin"` or `"user"`. Some endpoints send a list.
    #[serde(default, deserialize_with = "role_name")]
    pub role: Option<String>,
    /// `"active"` / `"disabled"`; older endpoints send `enabled: bool` instead.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept `"admin"`, `["user", "admin"]` (highest wins), or null.
fn role_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::One(s)) => Some(s),
        Some(Raw::Many(roles)) => {
            if roles.iter().any(|r| r.eq_ignore_ascii_case("admin")) {
                Some("admin".into())
            } else {
                roles.into_iter().next()
            }
        }
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleBody<'a> {
    pub role: &'a str,
}

// ── Device types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypeResponse {
    pub id: ApiId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: ApiId,
    pub name: String,
    #[serde(default, alias = "type", alias = "deviceTypeName")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "mac")]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ── History ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: ApiId,
    #[serde(default, alias = "deviceName")]
    pub device: Option<String>,
    pub action: String,
    #[serde(default, alias = "user", alias = "username")]
    pub actor: Option<String>,
    #[serde(default, alias = "value")]
    pub detail: Option<String>,
    #[serde(default, alias = "time", alias = "createdAt")]
    pub timestamp: Option<DateTime<Utc>>,
}

// ── Notifications ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: ApiId,
    pub title: String,
    #[serde(default, alias = "content")]
    pub message: Option<String>,
    #[serde(default, alias = "type")]
    pub level: Option<String>,
    #[serde(default, alias = "isRead")]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
