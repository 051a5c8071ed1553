//! Transport, rendering and environment configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;
use crate::join::JoinPolicy;

/// Backend address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// A secret string type for sensitive data like session cookies.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Generic transport options: a timeout plus transport-specific settings.
///
/// # Example
/// ```rust
/// use travel_chat::options::{HttpTransport, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions::new(
///     HttpTransport::default().with_base_url("http://localhost:5000".to_string()),
/// )
/// .with_timeout(Duration::from_secs(30));
/// assert_eq!(options.provider.base_url(), "http://localhost:5000");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions<T> {
    /// Request timeout. Streams are not bounded when unset.
    pub timeout: Option<Duration>,

    /// Transport-specific options
    pub provider: T,
}

impl<T> TransportOptions<T> {
    /// Create new transport options with transport-specific configuration.
    pub fn new(provider: T) -> Self {
        Self {
            timeout: None,
            provider,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP-specific transport options.
/// Used as the provider field in `TransportOptions<HttpTransport>`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Base URL of the backend
    pub base_url: Option<String>,

    /// Session cookie forwarded verbatim in the `Cookie` header
    pub cookie: Option<SecretString>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpTransport {
    /// Effective base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the session cookie.
    pub fn with_cookie(mut self, cookie: impl Into<SecretString>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// How streamed replies are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Chunk join policy
    pub join_policy: JoinPolicy,

    /// Class marking a message that is still streaming
    pub streaming_class: String,

    /// syntect theme used when emitting the highlight stylesheet
    pub theme: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            join_policy: JoinPolicy::Direct,
            streaming_class: "streaming".to_string(),
            theme: "InspiredGitHub".to_string(),
        }
    }
}

/// Everything a front end needs to start talking to the backend.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub transport: TransportOptions<HttpTransport>,
    pub render: RenderOptions,

    /// Account whose history the history endpoints operate on
    pub email: Option<String>,
}

impl ClientConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `TRAVEL_CHAT_BASE_URL` | backend base URL |
    /// | `TRAVEL_CHAT_COOKIE` | session cookie |
    /// | `TRAVEL_CHAT_EMAIL` | account for history operations |
    /// | `TRAVEL_CHAT_TIMEOUT_SECS` | request timeout |
    /// | `TRAVEL_CHAT_PROXY` | HTTP proxy |
    /// | `TRAVEL_CHAT_JOIN_POLICY` | `direct` or `spaced` |
    /// | `TRAVEL_CHAT_THEME` | highlight theme |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut provider = HttpTransport::default();
        if let Some(base_url) = get("TRAVEL_CHAT_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }
        if let Some(cookie) = get("TRAVEL_CHAT_COOKIE") {
            provider = provider.with_cookie(cookie);
        }
        if let Some(proxy) = get("TRAVEL_CHAT_PROXY") {
            provider = provider.with_proxy(proxy);
        }

        let mut transport = TransportOptions::new(provider);
        if let Some(secs) = get("TRAVEL_CHAT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("TRAVEL_CHAT_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            transport = transport.with_timeout(Duration::from_secs(secs));
        }

        let mut render = RenderOptions::default();
        if let Some(policy) = get("TRAVEL_CHAT_JOIN_POLICY") {
            render.join_policy = policy.parse().map_err(ClientError::Config)?;
        }
        if let Some(theme) = get("TRAVEL_CHAT_THEME") {
            render.theme = theme;
        }

        Ok(Self {
            transport,
            render,
            email: get("TRAVEL_CHAT_EMAIL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.transport.provider.base_url(), DEFAULT_BASE_URL);
        assert!(config.transport.timeout.is_none());
        assert_eq!(config.render, RenderOptions::default());
        assert!(config.email.is_none());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TRAVEL_CHAT_BASE_URL", "http://travel.local:8080/"),
            ("TRAVEL_CHAT_COOKIE", "session=abc"),
            ("TRAVEL_CHAT_EMAIL", "ann@example.com"),
            ("TRAVEL_CHAT_TIMEOUT_SECS", "45"),
            ("TRAVEL_CHAT_JOIN_POLICY", "spaced"),
            ("TRAVEL_CHAT_THEME", "base16-ocean.dark"),
        ]))
        .unwrap();

        assert_eq!(config.transport.provider.base_url(), "http://travel.local:8080");
        assert_eq!(
            config.transport.provider.cookie.as_ref().map(|c| c.expose_secret()),
            Some("session=abc")
        );
        assert_eq!(config.transport.timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.render.join_policy, JoinPolicy::Spaced);
        assert_eq!(config.render.theme, "base16-ocean.dark");
        assert_eq!(config.email.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = ClientConfig::from_lookup(lookup(&[("TRAVEL_CHAT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[("TRAVEL_CHAT_JOIN_POLICY", "merge")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let transport = HttpTransport::default().with_cookie("session=abc");
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("abc"));
        assert!(debug.contains("REDACTED"));
    }
}
