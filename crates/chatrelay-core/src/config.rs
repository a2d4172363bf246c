//! Relay configuration
//!
//! Everything is read from environment variables once at startup. Lookups go
//! through a closure so callers (and tests) can supply their own source.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{self, env};
use crate::error::ConfigError;

/// Which client the relay talks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiModel {
    /// Official chat completions API, authenticated with an API key
    #[serde(rename = "ChatGPTAPI")]
    ChatGptApi,
    /// Conversation backend behind a reverse proxy, authenticated with an access token
    #[serde(rename = "ChatGPTUnofficialProxyAPI")]
    ChatGptUnofficialProxyApi,
}

impl fmt::Display for ApiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiModel::ChatGptApi => write!(f, "ChatGPTAPI"),
            ApiModel::ChatGptUnofficialProxyApi => write!(f, "ChatGPTUnofficialProxyAPI"),
        }
    }
}

/// Credential used to authenticate against the provider
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

impl Credentials {
    /// Mode implied by this credential
    pub fn api_model(&self) -> ApiModel {
        match self {
            Credentials::ApiKey(_) => ApiModel::ChatGptApi,
            Credentials::AccessToken(_) => ApiModel::ChatGptUnofficialProxyApi,
        }
    }

    /// Raw secret for the Authorization header
    pub fn secret(&self) -> &str {
        match self {
            Credentials::ApiKey(s) | Credentials::AccessToken(s) => s,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(****)"),
            Credentials::AccessToken(_) => f.write_str("AccessToken(****)"),
        }
    }
}

/// SOCKS proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksProxy {
    pub host: String,
    pub port: u16,
}

impl SocksProxy {
    /// Proxy URL for the HTTP client; remote DNS resolution goes through the proxy
    pub fn url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for SocksProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Read-only snapshot reported by the config introspection call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub api_model: ApiModel,
    pub reverse_proxy: Option<String>,
    pub timeout_ms: u64,
    pub socks_proxy: String,
}

/// Full startup configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: Credentials,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub socks_proxy: Option<SocksProxy>,
    /// SOCKS endpoint as configured, or `-` when not set
    pub socks_proxy_label: String,
    /// Conversation endpoint override for the access-token client
    pub reverse_proxy: Option<String>,
    /// Base URL of the official API (chat completions and images)
    pub api_base_url: String,
    /// Model override; each client falls back to its own default
    pub model: Option<String>,
}

impl RelayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values count as unset. An API key takes precedence over an
    /// access token when both are present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let credentials = if let Some(key) = get(env::OPENAI_API_KEY) {
            Credentials::ApiKey(key)
        } else if let Some(token) = get(env::OPENAI_ACCESS_TOKEN) {
            Credentials::AccessToken(token)
        } else {
            return Err(ConfigError::MissingCredentials);
        };

        let timeout_ms = parse_timeout_ms(get(env::TIMEOUT_MS).as_deref());

        // Proxy settings only reach the access-token client; API-key mode reports them as given
        let strict = matches!(credentials, Credentials::AccessToken(_));

        let (socks_proxy, socks_proxy_label) =
            match (get(env::SOCKS_PROXY_HOST), get(env::SOCKS_PROXY_PORT)) {
                (Some(host), Some(port)) => {
                    let label = format!("{}:{}", host, port);
                    match port.trim().parse::<u16>() {
                        Ok(port) => (Some(SocksProxy { host, port }), label),
                        Err(_) if strict => return Err(ConfigError::InvalidProxy(label)),
                        Err(_) => {
                            warn!("SOCKS proxy {} has an invalid port; ignoring", label);
                            (None, label)
                        }
                    }
                }
                (Some(_), None) | (None, Some(_)) => {
                    warn!("SOCKS proxy needs both SOCKS_PROXY_HOST and SOCKS_PROXY_PORT; ignoring");
                    (None, constants::NO_SOCKS_PROXY.to_string())
                }
                (None, None) => (None, constants::NO_SOCKS_PROXY.to_string()),
            };

        let reverse_proxy = match get(env::API_REVERSE_PROXY) {
            Some(raw) if strict => Some(validate_url(env::API_REVERSE_PROXY, raw)?),
            Some(raw) => Some(raw.trim().to_string()),
            None => None,
        };

        let api_base_url = get(env::OPENAI_API_BASE_URL)
            .map(|u| validate_url(env::OPENAI_API_BASE_URL, u))
            .transpose()?
            .unwrap_or_else(|| constants::ai::OPENAI_API_BASE_URL.to_string());

        let config = Self {
            credentials,
            timeout_ms,
            socks_proxy,
            socks_proxy_label,
            reverse_proxy,
            api_base_url,
            model: get(env::OPENAI_API_MODEL),
        };
        debug!("Loaded relay config: {:?}", config);
        Ok(config)
    }

    pub fn api_model(&self) -> ApiModel {
        self.credentials.api_model()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Snapshot for the config introspection call
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            api_model: self.api_model(),
            reverse_proxy: self.reverse_proxy.clone(),
            timeout_ms: self.timeout_ms,
            socks_proxy: self.socks_proxy_label.clone(),
        }
    }
}

/// Parse TIMEOUT_MS, falling back to the default when unset or not a number
fn parse_timeout_ms(raw: Option<&str>) -> u64 {
    match raw.map(str::trim) {
        Some(v) => v.parse::<u64>().unwrap_or_else(|_| {
            warn!("TIMEOUT_MS={:?} is not a number; using default", v);
            constants::ai::DEFAULT_TIMEOUT_MS
        }),
        None => constants::ai::DEFAULT_TIMEOUT_MS,
    }
}

fn validate_url(var: &'static str, raw: String) -> Result<String, ConfigError> {
    url::Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { var, source })?;
    Ok(raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_credentials() {
        let err = RelayConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn test_empty_credentials_count_as_missing() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", ""),
            ("OPENAI_ACCESS_TOKEN", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn test_api_key_wins_over_access_token() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_ACCESS_TOKEN", "token"),
        ]))
        .unwrap();
        assert_eq!(config.api_model(), ApiModel::ChatGptApi);
        assert_eq!(config.credentials.secret(), "sk-test");
    }

    #[test]
    fn test_timeout_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k")])).unwrap();
        assert_eq!(config.timeout_ms, 30_000);

        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "k"),
            ("TIMEOUT_MS", "abc"),
        ]))
        .unwrap();
        assert_eq!(config.timeout_ms, 30_000);

        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "k"),
            ("TIMEOUT_MS", "60000"),
        ]))
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_model_config_api_key_only() {
        let config = RelayConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k")])).unwrap();
        let snapshot = config.model_config();
        assert_eq!(snapshot.api_model, ApiModel::ChatGptApi);
        assert_eq!(snapshot.socks_proxy, "-");
        assert_eq!(snapshot.reverse_proxy, None);
    }

    #[test]
    fn test_model_config_token_with_socks() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_ACCESS_TOKEN", "t"),
            ("SOCKS_PROXY_HOST", "127.0.0.1"),
            ("SOCKS_PROXY_PORT", "1080"),
            ("API_REVERSE_PROXY", "https://proxy.example.com/api/conversation"),
        ]))
        .unwrap();
        let snapshot = config.model_config();
        assert_eq!(snapshot.api_model, ApiModel::ChatGptUnofficialProxyApi);
        assert_eq!(snapshot.socks_proxy, "127.0.0.1:1080");
        assert_eq!(
            snapshot.reverse_proxy.as_deref(),
            Some("https://proxy.example.com/api/conversation")
        );
        assert_eq!(
            config.socks_proxy.unwrap().url(),
            "socks5h://127.0.0.1:1080"
        );
    }

    #[test]
    fn test_socks_requires_host_and_port() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_ACCESS_TOKEN", "t"),
            ("SOCKS_PROXY_HOST", "127.0.0.1"),
        ]))
        .unwrap();
        assert!(config.socks_proxy.is_none());
        assert_eq!(config.model_config().socks_proxy, "-");
    }

    #[test]
    fn test_invalid_socks_port() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_ACCESS_TOKEN", "t"),
            ("SOCKS_PROXY_HOST", "localhost"),
            ("SOCKS_PROXY_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProxy(_)));
    }

    #[test]
    fn test_api_key_mode_reports_unused_proxy_values_raw() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("SOCKS_PROXY_HOST", "127.0.0.1"),
            ("SOCKS_PROXY_PORT", "socks"),
            ("API_REVERSE_PROXY", "proxy.local/api"),
        ]))
        .unwrap();
        assert!(config.socks_proxy.is_none());
        let snapshot = config.model_config();
        assert_eq!(snapshot.api_model, ApiModel::ChatGptApi);
        assert_eq!(snapshot.socks_proxy, "127.0.0.1:socks");
        assert_eq!(snapshot.reverse_proxy.as_deref(), Some("proxy.local/api"));
    }

    #[test]
    fn test_invalid_reverse_proxy_url() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_ACCESS_TOKEN", "t"),
            ("API_REVERSE_PROXY", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                var: "API_REVERSE_PROXY",
                ..
            }
        ));
    }

    #[test]
    fn test_model_config_serializes_camel_case() {
        let config = RelayConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k")])).unwrap();
        let json = serde_json::to_value(config.model_config()).unwrap();
        assert_eq!(json["apiModel"], "ChatGPTAPI");
        assert_eq!(json["timeoutMs"], 30_000);
        assert_eq!(json["socksProxy"], "-");
        assert!(json["reverseProxy"].is_null());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::ApiKey("sk-secret".to_string());
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }
}
