use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;

/// Source of the bearer token attached to every request.
///
/// The token is issued by the external authentication service; providers
/// only hand out what they were given. They never fetch, refresh, or
/// validate it.
pub trait SessionProvider: Send + Sync {
    /// The current token, or `None` when no session is active.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// A fixed token resolved once at startup (CLI flag, env var, keyring).
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl SessionProvider for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

/// Process-wide session with a "set at login, cleared at logout" lifecycle.
///
/// Cheaply cloneable; all clones observe the same session. Swaps are
/// lock-free, so in-flight requests keep the token they started with.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    token: Arc<ArcSwapOption<SecretString>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the token handed back by the auth service.
    pub fn login(&self, token: SecretString) {
        self.token.store(Some(Arc::new(token)));
    }

    /// Drop the token (logout or expiry).
    pub fn logout(&self) {
        self.token.store(None);
    }

    pub fn is_active(&self) -> bool {
        self.token.load().is_some()
    }
}

impl SessionProvider for SharedSession {
    fn bearer_token(&self) -> Option<SecretString> {
        self.token.load_full().map(|t| (*t).clone())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn shared_session_lifecycle() {
        let session = SharedSession::new();
        assert!(session.bearer_token().is_none());

        let observer = session.clone();
        session.login(SecretString::from("abc"));
        assert!(observer.is_active());
        assert_eq!(
            observer.bearer_token().map(|t| t.expose_secret().to_owned()),
            Some("abc".to_owned())
        );

        session.logout();
        assert!(!observer.is_active());
        assert!(observer.bearer_token().is_none());
    }

    #[test]
    fn static_token_always_present() {
        let provider = StaticToken::new(SecretString::from("t0k"));
        assert!(provider.bearer_token().is_some());
    }
}
