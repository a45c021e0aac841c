// REST implementation of the backend traits on top of `ptit_api::ApiClient`.

use ptit_api::ApiClient;
use ptit_api::client::NOTIFICATIONS;
use ptit_api::types::NotificationResponse;
use serde_json::json;
use tracing::debug;

use super::{ListBackend, NotificationBackend, ResourceBackend, RoleBackend, StatusBackend};
use crate::config::RoleChangeStrategy;
use crate::error::CoreError;
use crate::model::{
    Device, DeviceType, EntityId, HistoryEntry, Listable, Notification, Role, User,
};

/// Backend that talks to the platform's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ApiClient,
    role_change: RoleChangeStrategy,
}

impl HttpBackend {
    pub fn new(client: ApiClient, role_change: RoleChangeStrategy) -> Self {
        Self {
            client,
            role_change,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn role_change(&self) -> RoleChangeStrategy {
        self.role_change
    }
}

/// Error mapper that names the record a 404 was about.
fn targeted<T: Listable>(id: &EntityId) -> impl FnOnce(ptit_api::Error) -> CoreError + '_ {
    move |e| CoreError::from(e).for_target(T::ENTITY_TYPE, &id.to_string())
}

fn convert_all<R, T: From<R>>(raw: Vec<R>) -> Vec<T> {
    raw.into_iter().map(T::from).collect()
}

// ── Users ───────────────────────────────────────────────────────────

impl ListBackend<User> for HttpBackend {
    async fn list(&self) -> Result<Vec<User>, CoreError> {
        Ok(convert_all(self.client.list_users().await?))
    }
}

impl ResourceBackend<User> for HttpBackend {
    async fn create(&self, draft: &crate::model::NewUser) -> Result<User, CoreError> {
        Ok(self.client.create_user(draft).await?.into())
    }

    async fn update(
        &self,
        id: &EntityId,
        patch: &crate::model::UserPatch,
    ) -> Result<User, CoreError> {
        self.client
            .update_user(&id.to_string(), patch)
            .await
            .map(User::from)
            .map_err(targeted::<User>(id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client
            .delete_user(&id.to_string())
            .await
            .map_err(targeted::<User>(id))
    }
}

impl StatusBackend<User> for HttpBackend {
    async fn set_active(&self, id: &EntityId, active: bool) -> Result<User, CoreError> {
        self.client
            .set_user_enabled(&id.to_string(), active)
            .await
            .map(User::from)
            .map_err(targeted::<User>(id))
    }
}

impl RoleBackend for HttpBackend {
    async fn change_role(&self, id: &EntityId, role: Role) -> Result<User, CoreError> {
        let raw_id = id.to_string();
        debug!(user = %raw_id, %role, strategy = ?self.role_change, "changing role");
        let result = match (self.role_change, role) {
            (RoleChangeStrategy::Dedicated, Role::Admin) => {
                self.client.assign_role(&raw_id, Role::Admin.as_ref()).await
            }
            (RoleChangeStrategy::Dedicated, Role::User) => {
                self.client.remove_role(&raw_id, Role::Admin.as_ref()).await
            }
            (RoleChangeStrategy::GenericUpdate, role) => {
                self.client
                    .update_user(&raw_id, &json!({ "role": role }))
                    .await
            }
        };
        result.map(User::from).map_err(targeted::<User>(id))
    }
}

// ── Device types ────────────────────────────────────────────────────

impl ListBackend<DeviceType> for HttpBackend {
    async fn list(&self) -> Result<Vec<DeviceType>, CoreError> {
        Ok(convert_all(self.client.list_device_types().await?))
    }
}

impl ResourceBackend<DeviceType> for HttpBackend {
    async fn create(&self, draft: &crate::model::NewDeviceType) -> Result<DeviceType, CoreError> {
        Ok(self.client.create_device_type(draft).await?.into())
    }

    async fn update(
        &self,
        id: &EntityId,
        patch: &crate::model::DeviceTypePatch,
    ) -> Result<DeviceType, CoreError> {
        self.client
            .update_device_type(&id.to_string(), patch)
            .await
            .map(DeviceType::from)
            .map_err(targeted::<DeviceType>(id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client
            .delete_device_type(&id.to_string())
            .await
            .map_err(targeted::<DeviceType>(id))
    }
}

// ── Devices ─────────────────────────────────────────────────────────

impl ListBackend<Device> for HttpBackend {
    async fn list(&self) -> Result<Vec<Device>, CoreError> {
        Ok(convert_all(self.client.list_devices().await?))
    }
}

impl ResourceBackend<Device> for HttpBackend {
    async fn create(&self, draft: &crate::model::NewDevice) -> Result<Device, CoreError> {
        Ok(self.client.create_device(draft).await?.into())
    }

    async fn update(
        &self,
        id: &EntityId,
        patch: &crate::model::DevicePatch,
    ) -> Result<Device, CoreError> {
        self.client
            .update_device(&id.to_string(), patch)
            .await
            .map(Device::from)
            .map_err(targeted::<Device>(id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client
            .delete_device(&id.to_string())
            .await
            .map_err(targeted::<Device>(id))
    }
}

impl StatusBackend<Device> for HttpBackend {
    async fn set_active(&self, id: &EntityId, active: bool) -> Result<Device, CoreError> {
        self.client
            .set_device_enabled(&id.to_string(), active)
            .await
            .map(Device::from)
            .map_err(targeted::<Device>(id))
    }
}

// ── History ─────────────────────────────────────────────────────────

impl ListBackend<HistoryEntry> for HttpBackend {
    async fn list(&self) -> Result<Vec<HistoryEntry>, CoreError> {
        Ok(convert_all(self.client.list_history().await?))
    }
}

// ── Notifications ───────────────────────────────────────────────────

impl ListBackend<Notification> for HttpBackend {
    async fn list(&self) -> Result<Vec<Notification>, CoreError> {
        Ok(convert_all(self.client.list_notifications().await?))
    }
}

impl ResourceBackend<Notification> for HttpBackend {
    async fn create(
        &self,
        draft: &crate::model::NewNotification,
    ) -> Result<Notification, CoreError> {
        let raw: NotificationResponse = self.client.create(NOTIFICATIONS, draft).await?;
        Ok(raw.into())
    }

    async fn update(
        &self,
        id: &EntityId,
        patch: &crate::model::NotificationPatch,
    ) -> Result<Notification, CoreError> {
        self.client
            .update::<NotificationResponse, _>(NOTIFICATIONS, &id.to_string(), patch)
            .await
            .map(Notification::from)
            .map_err(targeted::<Notification>(id))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client
            .delete_notification(&id.to_string())
            .await
            .map_err(targeted::<Notification>(id))
    }
}

impl NotificationBackend for HttpBackend {
    async fn mark_read(&self, id: &EntityId) -> Result<(), CoreError> {
        self.client
            .mark_notification_read(&id.to_string())
            .await
            .map_err(targeted::<Notification>(id))
    }
}
