// ── User accounts ──

use std::borrow::Cow;
use std::fmt;

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
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AccountStatus {
    #[default]
    Active,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Listable for User {
    const ENTITY_TYPE: &'static str = "user";
    const FILTER_KEYS: &'static [&'static str] = &["role", "status"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.username.as_str()];
        fields.extend(self.full_name.as_deref());
        fields.extend(self.email.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "role" => Some(Cow::Borrowed(self.role.as_ref())),
            "status" => Some(Cow::Borrowed(self.status.as_ref())),
            _ => None,
        }
    }
}

impl Toggleable for User {
    fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    fn with_active(mut self, active: bool) -> Self {
        self.status = if active {
            AccountStatus::Active
        } else {
            AccountStatus::Disabled
        };
        self
    }
}

// ── Payloads ────────────────────────────────────────────────────────

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .finish()
    }
}

impl Payload for NewUser {
    const REQUIRED: &'static [&'static str] = &["username", "email"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Payload for UserPatch {
    const REQUIRED: &'static [&'static str] = NewUser::REQUIRED;
}

impl Editable for User {
    type Draft = NewUser;
    type Patch = UserPatch;

    fn from_draft(id: EntityId, draft: &NewUser) -> Self {
        Self {
            id,
            username: draft.username.clone(),
            full_name: draft.full_name.clone(),
            email: Some(draft.email.clone()),
            role: draft.role.unwrap_or_default(),
            status: AccountStatus::Active,
            created_at: Some(Utc::now()),
        }
    }

    fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(username) = &patch.username {
            self.username.clone_from(username);
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(full_name) = &patch.full_name {
            self.full_name = Some(full_name.clone());
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }
}
