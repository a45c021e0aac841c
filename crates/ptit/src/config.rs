//! CLI configuration -- thin wrapper around `ptit_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use ptit_core::{ClientConfig, PageSize, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ptit_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Everything a resource command needs to reach the backend.
#[derive(Debug, Clone)]
pub struct Connection {
    pub profile: String,
    pub client: ClientConfig,
    pub page_size: PageSize,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build the connection from the config file, profile, and CLI overrides.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return Ok(Connection {
            client: resolve_profile(profile, &profile_name, global)?,
            page_size: cfg.page_size(Some(profile))?,
            profile: profile_name,
        });
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // No profile -- build from CLI flags / env vars alone.
    let url_str = global.api_url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let token = global
        .token
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?;

    let mut client = ClientConfig::new(ptit_config::parse_api_url(url_str)?, token);
    apply_overrides(&mut client, global);

    Ok(Connection {
        profile: profile_name,
        client,
        page_size: cfg.page_size(None)?,
    })
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ClientConfig, CliError> {
    let token = match &global.token {
        Some(token) => SecretString::from(token.clone()),
        None => ptit_config::resolve_token(profile, profile_name)?,
    };

    let mut client = ptit_config::profile_to_client_config(profile, token)?;
    if let Some(url) = &global.api_url {
        client.api_url = ptit_config::parse_api_url(url)?;
    }
    apply_overrides(&mut client, global);
    Ok(client)
}

fn apply_overrides(client: &mut ClientConfig, global: &GlobalOpts) {
    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["ptit"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["history", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn profile() -> Profile {
        Profile {
            api_url: "https://iot.ptit.edu.vn/api".into(),
            token: Some("from-file".into()),
            timeout: Some(10),
            ..Profile::default()
        }
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&[
            "--api-url",
            "http://localhost:8080/api",
            "--token",
            "from-flag",
            "--timeout",
            "5",
            "-k",
        ]);
        let client = resolve_profile(&profile(), "lab", &g).unwrap();

        assert_eq!(client.api_url.as_str(), "http://localhost:8080/api");
        assert_eq!(client.token.expose_secret(), "from-flag");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_non_http_url_flag() {
        let g = global(&["--api-url", "ftp://iot.ptit.edu.vn", "--token", "t"]);
        let err = resolve_profile(&profile(), "lab", &g).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
