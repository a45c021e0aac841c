// Hand-crafted async HTTP client for the PTIT IoT Platform backend.
//
// Resources live under the configured base URL (`/api/` by convention):
//   /users, /device-types, /devices, /history, /notifications
// Auth: `Authorization: Bearer <token>` from the injected SessionProvider.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::session::SessionProvider;
use crate::transport::TransportConfig;
use crate::types::{
    DeviceResponse, DeviceTypeResponse, ErrorBody, HistoryEntryResponse, ItemBody,
    ListBody, NotificationResponse, RoleBody, UserResponse,
};

// ── Resource paths ──────────────────────────────────────────────────

pub const USERS: &str = "users";
pub const DEVICE_TYPES: &str = "device-types";
pub const DEVICES: &str = "devices";
pub const HISTORY: &str = "history";
pub const NOTIFICATIONS: &str = "notifications";

// ── Client ──────────────────────────────────────────────────────────

/// Async client for the platform's REST resources.
///
/// Cheap to clone: the underlying `reqwest::Client` and session provider
/// are reference-counted.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, session provider, and transport config.
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionProvider>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http, session)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// Ensure the base URL is hierarchical and ends with `/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL. Segments are percent-encoded,
    /// so identifiers containing `/` cannot escape their resource.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let token = self.session.bearer_token().ok_or(Error::NoSession)?;
        Ok(req.bearer_auth(token.expose_secret()))
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_list<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>, Error> {
        let url = self.url(segments);
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url))?.send().await?;
        let body: ListBody<T> = self.handle_response(resp).await?;
        Ok(body.into_vec())
    }

    async fn get_item<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url))?.send().await?;
        let body: ItemBody<T> = self.handle_response(resp).await?;
        Ok(body.into_inner())
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url))?.json(body).send().await?;
        let body: ItemBody<T> = self.handle_response(resp).await?;
        Ok(body.into_inner())
    }

    async fn post_no_response<B: Serialize + Sync + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(segments);
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url))?.json(body).send().await?;
        self.handle_empty(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("PUT {url}");

        let resp = self.authorize(self.http.put(url))?.json(body).send().await?;
        let body: ItemBody<T> = self.handle_response(resp).await?;
        Ok(body.into_inner())
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let url = self.url(segments);
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url))?.send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorBody>(&raw).ok();

        let (message, code) = match parsed {
            Some(ErrorBody {
                message: Some(message),
                code,
            }) => (message, code),
            Some(ErrorBody { message: None, code }) => (status.to_string(), code),
            None if raw.is_empty() => (status.to_string(), None),
            None => (raw, None),
        };

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication { message };
        }

        Error::Api {
            status: status.as_u16(),
            message,
            code,
        }
    }

    // ━━ Generic resource API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /{resource}`
    pub async fn list<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>, Error> {
        self.get_list(&[resource]).await
    }

    /// `GET /{resource}/{id}`
    pub async fn fetch<T: DeserializeOwned>(&self, resource: &str, id: &str) -> Result<T, Error> {
        self.get_item(&[resource, id]).await
    }

    /// `POST /{resource}`
    pub async fn create<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(&[resource], body).await
    }

    /// `PUT /{resource}/{id}`
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        resource: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.put(&[resource, id], body).await
    }

    /// `DELETE /{resource}/{id}`
    pub async fn remove(&self, resource: &str, id: &str) -> Result<(), Error> {
        self.delete(&[resource, id]).await
    }

    /// `POST /{resource}/{id}/{action}` returning the updated record.
    pub async fn action<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        resource: &str,
        id: &str,
        action: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(&[resource, id, action], body).await
    }

    // ━━ Typed endpoints ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Users ────────────────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, Error> {
        self.list(USERS).await
    }

    pub async fn create_user<B: Serialize + Sync + ?Sized>(
        &self,
        body: &B,
    ) -> Result<UserResponse, Error> {
        self.create(USERS, body).await
    }

    pub async fn update_user<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<UserResponse, Error> {
        self.update(USERS, id, body).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), Error> {
        self.remove(USERS, id).await
    }

    pub async fn assign_role(&self, id: &str, role: &str) -> Result<UserResponse, Error> {
        self.action(USERS, id, "assign-role", &RoleBody { role }).await
    }

    pub async fn remove_role(&self, id: &str, role: &str) -> Result<UserResponse, Error> {
        self.action(USERS, id, "remove-role", &RoleBody { role }).await
    }

    /// `POST /users/{id}/enable|disable`
    pub async fn set_user_enabled(&self, id: &str, enabled: bool) -> Result<UserResponse, Error> {
        self.action(USERS, id, enable_action(enabled), &serde_json::json!({}))
            .await
    }

    // ── Device types ─────────────────────────────────────────────────

    pub async fn list_device_types(&self) -> Result<Vec<DeviceTypeResponse>, Error> {
        self.list(DEVICE_TYPES).await
    }

    pub async fn create_device_type<B: Serialize + Sync + ?Sized>(
        &self,
        body: &B,
    ) -> Result<DeviceTypeResponse, Error> {
        self.create(DEVICE_TYPES, body).await
    }

    pub async fn update_device_type<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<DeviceTypeResponse, Error> {
        self.update(DEVICE_TYPES, id, body).await
    }

    pub async fn delete_device_type(&self, id: &str) -> Result<(), Error> {
        self.remove(DEVICE_TYPES, id).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(&self) -> Result<Vec<DeviceResponse>, Error> {
        self.list(DEVICES).await
    }

    pub async fn create_device<B: Serialize + Sync + ?Sized>(
        &self,
        body: &B,
    ) -> Result<DeviceResponse, Error> {
        self.create(DEVICES, body).await
    }

    pub async fn update_device<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<DeviceResponse, Error> {
        self.update(DEVICES, id, body).await
    }

    pub async fn delete_device(&self, id: &str) -> Result<(), Error> {
        self.remove(DEVICES, id).await
    }

    /// `POST /devices/{id}/enable|disable`
    pub async fn set_device_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<DeviceResponse, Error> {
        self.action(DEVICES, id, enable_action(enabled), &serde_json::json!({}))
            .await
    }

    // ── History ──────────────────────────────────────────────────────

    pub async fn list_history(&self) -> Result<Vec<HistoryEntryResponse>, Error> {
        self.list(HISTORY).await
    }

    // ── Notifications ────────────────────────────────────────────────

    pub async fn list_notifications(&self) -> Result<Vec<NotificationResponse>, Error> {
        self.list(NOTIFICATIONS).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<(), Error> {
        self.post_no_response(&[NOTIFICATIONS, id, "read"], &serde_json::json!({}))
            .await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<(), Error> {
        self.remove(NOTIFICATIONS, id).await
    }
}

fn enable_action(enabled: bool) -> &'static str {
    if enabled { "enable" } else { "disable" }
}
