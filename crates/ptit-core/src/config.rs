// ── Runtime connection configuration ──
//
// These types describe how to reach the platform backend. They carry the
// bearer token and transport tuning but never touch disk: the CLI builds
// a `ClientConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ptit_api::{ApiClient, SessionProvider, StaticToken, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::backend::HttpBackend;
use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (lab servers with self-signed certs).
    DangerAcceptInvalid,
}

/// Which endpoints carry a role change.
///
/// The backend exposes both dedicated `assign-role` / `remove-role`
/// actions and a generic `PUT /users/{id}` that accepts `role`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RoleChangeStrategy {
    /// `POST /users/{id}/assign-role` to grant admin, `remove-role` to revoke.
    #[default]
    Dedicated,
    /// `PUT /users/{id}` with `{"role": ...}`.
    GenericUpdate,
}

/// Everything needed to talk to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://iot.ptit.edu.vn/api`.
    pub api_url: Url,
    /// Bearer token issued by the auth service.
    pub token: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub role_change: RoleChangeStrategy,
}

impl ClientConfig {
    pub fn new(api_url: Url, token: SecretString) -> Self {
        Self {
            api_url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            role_change: RoleChangeStrategy::default(),
        }
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    /// Build an `ApiClient` using the configured static token.
    pub fn build_client(&self) -> Result<ApiClient, CoreError> {
        let session: Arc<dyn SessionProvider> = Arc::new(StaticToken::new(self.token.clone()));
        self.build_client_with(session)
    }

    /// Build an `ApiClient` around an externally managed session.
    pub fn build_client_with(
        &self,
        session: Arc<dyn SessionProvider>,
    ) -> Result<ApiClient, CoreError> {
        Ok(ApiClient::new(
            self.api_url.as_str(),
            session,
            &self.transport(),
        )?)
    }

    pub fn build_backend(&self) -> Result<HttpBackend, CoreError> {
        Ok(HttpBackend::new(self.build_client()?, self.role_change))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn role_change_strategy_names() {
        assert_eq!(RoleChangeStrategy::GenericUpdate.to_string(), "generic-update");
        assert_eq!(
            "dedicated".parse::<RoleChangeStrategy>().unwrap(),
            RoleChangeStrategy::Dedicated
        );
    }

    #[test]
    fn missing_ca_file_is_a_network_error() {
        let mut config = ClientConfig::new(
            Url::parse("https://iot.example/api").unwrap(),
            SecretString::from("t"),
        );
        config.tls = TlsVerification::CustomCa("/nonexistent/ca.pem".into());

        let err = config.build_client().unwrap_err();
        assert!(err.to_string().contains("CA cert"), "{err}");
    }
}
