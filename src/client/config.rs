//! Client configuration read from a TOML file.
//!
//! ```toml
//! auth_url = "https://auth.example.com/oauth/token"
//! api_base_url = "https://api.example.com"
//! client_id = "my-client"
//! cert_path = "~/.certs/client.crt"
//! key_path = "~/.certs/client.key"
//! timeout_secs = 30
//! due_date_policy = "reject"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::{DueDatePolicy, MappingOptions};

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV: &str = "BOLETO_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from loading a [`ClientConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot determine home directory")]
    NoHomeDir,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Endpoints and credentials for the invoicing API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Token endpoint for the client-credentials grant.
    pub auth_url: String,
    /// API host, without the `/v2/invoices` suffix.
    pub api_base_url: String,
    pub client_id: String,
    /// PEM client certificate.
    pub cert_path: PathBuf,
    /// PEM private key matching `cert_path`.
    pub key_path: PathBuf,
    /// Applies to every network call, token requests included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub due_date_policy: DueDatePolicy,
}

impl ClientConfig {
    /// Parse and normalize a config from TOML text.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or a required value is empty.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.normalized()
    }

    /// Read a config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Default config location: `$BOLETO_CONFIG` if set, else `$HOME/.config/boleto.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".config").join("boleto.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Collection endpoint, e.g. `https://api.example.com/v2/invoices`.
    pub fn invoices_url(&self) -> String {
        format!("{}/v2/invoices", self.api_base_url)
    }

    /// Single-document endpoint. The id is percent-encoded as one path segment.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the base URL cannot carry a path.
    pub fn invoice_url(&self, id: &str) -> Result<String, ConfigError> {
        let mut url = reqwest::Url::parse(&self.invoices_url())
            .map_err(|e| ConfigError::Invalid(format!("api_base_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ConfigError::Invalid("api_base_url cannot be a base URL".into()))?
            .push(id);
        Ok(url.into())
    }

    /// Row-mapping defaults with this config's due-date policy.
    pub fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            due_date_policy: self.due_date_policy,
            ..MappingOptions::default()
        }
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("api_base_url", &self.api_base_url),
            ("client_id", &self.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        self.auth_url = self.auth_url.trim().to_string();
        self.client_id = self.client_id.trim().to_string();
        self.api_base_url = normalize_base_url(&self.api_base_url);
        reqwest::Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::Invalid(format!("api_base_url: {e}")))?;
        self.cert_path = expand_home(&self.cert_path);
        self.key_path = expand_home(&self.key_path);
        Ok(self)
    }
}

/// Strip trailing `/`, `/invoices` and `/v2` so either the host or the full
/// collection URL can be configured.
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/');
    url = url.strip_suffix("/invoices").unwrap_or(url).trim_end_matches('/');
    url = url.strip_suffix("/v2").unwrap_or(url).trim_end_matches('/');
    url.to_string()
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        auth_url = "https://auth.example.com/token"
        api_base_url = "https://api.example.com/v2/invoices/"
        client_id = "client-1"
        cert_path = "/etc/boleto/client.crt"
        key_path = "/etc/boleto/client.key"
    "#;

    #[test]
    fn defaults_applied() {
        let config = ClientConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.due_date_policy, DueDatePolicy::Reject);
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(
            config.invoice_url("abc").unwrap(),
            "https://api.example.com/v2/invoices/abc"
        );
        assert_eq!(config.mapping_options(), MappingOptions::default());
    }

    #[test]
    fn document_id_encoded_as_one_segment() {
        let config = ClientConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(
            config.invoice_url("a/b?c#d").unwrap(),
            "https://api.example.com/v2/invoices/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            config.invoice_url("../x").unwrap(),
            "https://api.example.com/v2/invoices/..%2Fx"
        );
    }

    #[test]
    fn malformed_base_url_rejected() {
        let toml = MINIMAL.replace("https://api.example.com/v2/invoices/", "not a url");
        assert!(matches!(
            ClientConfig::from_toml_str(&toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn base_url_variants() {
        assert_eq!(normalize_base_url("https://h.com"), "https://h.com");
        assert_eq!(normalize_base_url("https://h.com/"), "https://h.com");
        assert_eq!(normalize_base_url("https://h.com/v2"), "https://h.com");
        assert_eq!(normalize_base_url("https://h.com/v2/invoices"), "https://h.com");
    }

    #[test]
    fn lenient_policy_parsed() {
        let toml = format!("{MINIMAL}\ndue_date_policy = \"next_day\"\ntimeout_secs = 5");
        let config = ClientConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.due_date_policy, DueDatePolicy::NextDay);
        assert_eq!(config.mapping_options().due_date_policy, DueDatePolicy::NextDay);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_values_rejected() {
        let toml = MINIMAL.replace("client-1", " ");
        assert!(matches!(
            ClientConfig::from_toml_str(&toml),
            Err(ConfigError::Invalid(_))
        ));
        let toml = format!("{MINIMAL}\ntimeout_secs = 0");
        assert!(ClientConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn missing_key_is_parse_error() {
        let toml = MINIMAL.replace("client_id = \"client-1\"", "");
        assert!(matches!(
            ClientConfig::from_toml_str(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn home_expansion() {
        let expanded = expand_home(Path::new("~/certs/client.crt"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("certs/client.crt"));
        }
        assert_eq!(
            expand_home(Path::new("/abs/client.crt")),
            PathBuf::from("/abs/client.crt")
        );
    }
}
