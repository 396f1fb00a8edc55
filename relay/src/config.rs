use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener cannot share {0}")]
    ListenerConflict(String),

    #[error("Downstream URL must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Timeout cannot be 0")]
    ZeroTimeout,
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";
pub const ENV_DOWNSTREAM_URL: &str = "ZFLOW_URL";
pub const ENV_WEBHOOK_SECRET: &str = "FRAMER_WEBHOOK_SECRET";
pub const ENV_PIXEL: &str = "RELAY_PIXEL";
pub const ENV_STRICT_DOWNSTREAM: &str = "RELAY_STRICT_DOWNSTREAM";
pub const ENV_TIMEOUT_SECS: &str = "RELAY_TIMEOUT_SECS";
pub const ENV_HOST: &str = "RELAY_HOST";
pub const ENV_PORT: &str = "RELAY_PORT";

/// Server configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Main listener for incoming webhooks
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    pub relay: RelayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 3001,
            },
            relay: RelayConfig::default(),
        }
    }
}

impl Config {
    /// Validates the server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict(format!(
                "{}:{}",
                self.listener.host, self.listener.port
            )));
        }

        self.relay.validate()
    }

    /// Overrides file values with the relay's environment variables.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`. A variable
    /// that is set but empty clears the corresponding optional setting.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
            self.listener.host = host.trim().to_string();
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.listener.port = port.trim().parse().map_err(|_| EnvError::InvalidValue {
                name: ENV_PORT,
                value: port,
            })?;
        }

        self.relay.apply_env(lookup)
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Behaviour of the relay handler itself
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Where normalized payloads are posted. Requests fail with a 500 while unset.
    pub downstream_url: Option<Url>,
    /// Allowed origins; `*.example.com` also matches subdomains. Empty allows every origin.
    pub cors_origins: Vec<String>,
    /// Enables advisory checking of the `Framer-Signature` header.
    pub webhook_secret: Option<String>,
    /// Accept GET requests and answer them with a transparent GIF.
    pub pixel: bool,
    /// Report a non-2xx downstream status as a 502 instead of a 200.
    pub strict_downstream: bool,
    /// Limit on the whole downstream exchange. No limit when unset.
    pub timeout_secs: Option<u64>,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.downstream_url
            && !matches!(url.scheme(), "http" | "https")
        {
            return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }

        if self.timeout_secs == Some(0) {
            return Err(ValidationError::ZeroTimeout);
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origins) = lookup(ENV_CORS_ORIGIN) {
            self.cors_origins = parse_origin_list(&origins);
        }

        if let Some(url) = lookup(ENV_DOWNSTREAM_URL) {
            self.downstream_url = match url.trim() {
                "" => None,
                trimmed => Some(Url::parse(trimmed).map_err(|source| EnvError::InvalidUrl {
                    name: ENV_DOWNSTREAM_URL,
                    source,
                })?),
            };
        }

        if let Some(secret) = lookup(ENV_WEBHOOK_SECRET) {
            self.webhook_secret = Some(secret).filter(|s| !s.is_empty());
        }

        if let Some(pixel) = lookup(ENV_PIXEL) {
            self.pixel = parse_flag(ENV_PIXEL, pixel)?;
        }

        if let Some(strict) = lookup(ENV_STRICT_DOWNSTREAM) {
            self.strict_downstream = parse_flag(ENV_STRICT_DOWNSTREAM, strict)?;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = match timeout.trim() {
                "" => None,
                trimmed => Some(trimmed.parse().map_err(|_| EnvError::InvalidValue {
                    name: ENV_TIMEOUT_SECS,
                    value: timeout.clone(),
                })?),
            };
        }

        Ok(())
    }
}

/// Splits a comma separated allow-list, dropping blank entries.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, EnvError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "127.0.0.1"
    port: 8081
relay:
    downstream_url: "https://flow.zoho.com/123/flow/webhook/incoming?zapikey=abc"
    cors_origins:
        - "*.framer.app"
        - "example.com"
    pixel: true
    timeout_secs: 10
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.relay.cors_origins.len(), 2);
        assert!(config.relay.pixel);
        assert!(!config.relay.strict_downstream);
        assert_eq!(config.relay.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(
            config.relay.downstream_url.unwrap().host_str(),
            Some("flow.zoho.com")
        );
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.relay.downstream_url, None);
        assert_eq!(config.relay.timeout(), None);
    }

    #[test]
    fn test_validation_errors() {
        let base_config = Config::default();

        let mut config = base_config.clone();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config.clone();
        config.admin_listener = config.listener.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ListenerConflict(_)
        ));

        let mut config = base_config.clone();
        config.relay.downstream_url = Some(Url::parse("ftp://files.example.com/").unwrap());
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::UnsupportedScheme(_)
        ));

        let mut config = base_config;
        config.relay.timeout_secs = Some(0);
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ZeroTimeout
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(serde_yaml::from_str::<Config>("relay: {downstream_url: not-a-url}").is_err());

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Config>(r#"listener: {host: "0.0.0.0", port: "http"}"#)
                .is_err()
        );

        // Listener without port
        assert!(serde_yaml::from_str::<Config>(r#"listener: {host: "0.0.0.0"}"#).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("CORS_ORIGIN", " *.framer.app, ,https://example.com "),
                ("ZFLOW_URL", "https://flow.zoho.com/hook"),
                ("FRAMER_WEBHOOK_SECRET", "s3cret"),
                ("RELAY_PIXEL", "true"),
                ("RELAY_STRICT_DOWNSTREAM", "1"),
                ("RELAY_TIMEOUT_SECS", "15"),
                ("RELAY_PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(
            config.relay.cors_origins,
            vec!["*.framer.app".to_string(), "https://example.com".to_string()]
        );
        assert_eq!(
            config.relay.downstream_url.as_ref().map(Url::as_str),
            Some("https://flow.zoho.com/hook")
        );
        assert_eq!(config.relay.webhook_secret.as_deref(), Some("s3cret"));
        assert!(config.relay.pixel);
        assert!(config.relay.strict_downstream);
        assert_eq!(config.relay.timeout_secs, Some(15));
        assert_eq!(config.listener.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_env_clears_optional_values() {
        let mut config = Config::default();
        config.relay.downstream_url = Some(Url::parse("https://flow.zoho.com/hook").unwrap());
        config.relay.cors_origins = vec!["example.com".into()];
        config.relay.webhook_secret = Some("s3cret".into());

        config
            .apply_env(env(&[
                ("ZFLOW_URL", ""),
                ("CORS_ORIGIN", ""),
                ("FRAMER_WEBHOOK_SECRET", ""),
            ]))
            .unwrap();

        assert_eq!(config.relay.downstream_url, None);
        assert!(config.relay.cors_origins.is_empty());
        assert_eq!(config.relay.webhook_secret, None);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[("ZFLOW_URL", "flow.zoho.com")])),
            Err(EnvError::InvalidUrl { .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[("RELAY_PIXEL", "maybe")])),
            Err(EnvError::InvalidValue { name: ENV_PIXEL, .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[("RELAY_PORT", "http")])),
            Err(EnvError::InvalidValue { name: ENV_PORT, .. })
        ));
    }
}
