//! Client configuration
//!
//! Every setting is resolved once, in one place, with a fixed precedence:
//! explicit value, then environment variable, then the profile file, then
//! the built-in default. Settings with no default fail resolution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::retry::{Backoff, RetryPolicy};

pub const DEFAULT_URL: &str = "https://us-east.manta.joyent.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_RETRIES: u32 = 3;
/// Upper bound accepted for the retry count
pub const MAX_RETRIES: u32 = 100;

pub const ENV_URL: &str = "MANTA_URL";
pub const ENV_USER: &str = "MANTA_USER";
pub const ENV_SUBUSER: &str = "MANTA_SUBUSER";
pub const ENV_KEY_ID: &str = "MANTA_KEY_ID";
pub const ENV_KEY_PATH: &str = "MANTA_KEY_PATH";
pub const ENV_KEY_CONTENT: &str = "MANTA_KEY_CONTENT";
pub const ENV_SIGNATURE_ALGORITHM: &str = "MANTA_SIGNATURE_ALGORITHM";
pub const ENV_TIMEOUT: &str = "MANTA_TIMEOUT";
pub const ENV_RETRIES: &str = "MANTA_HTTP_RETRIES";
pub const ENV_TLS_INSECURE: &str = "MANTA_TLS_INSECURE";
pub const ENV_CONFIG_DIR: &str = "MANTA_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// HTTP Signature algorithm names understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    RsaSha1,
    #[default]
    RsaSha256,
    RsaSha512,
    DsaSha1,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
}

impl SignatureAlgorithm {
    /// Canonical upper-case name, e.g. `RSA-SHA256`
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaSha1 => "RSA-SHA1",
            SignatureAlgorithm::RsaSha256 => "RSA-SHA256",
            SignatureAlgorithm::RsaSha512 => "RSA-SHA512",
            SignatureAlgorithm::DsaSha1 => "DSA-SHA1",
            SignatureAlgorithm::EcdsaSha256 => "ECDSA-SHA256",
            SignatureAlgorithm::EcdsaSha384 => "ECDSA-SHA384",
            SignatureAlgorithm::EcdsaSha512 => "ECDSA-SHA512",
        }
    }

    /// Name as rendered in the Authorization header
    pub fn header_name(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "RSA-SHA1" => Ok(SignatureAlgorithm::RsaSha1),
            "RSA-SHA256" => Ok(SignatureAlgorithm::RsaSha256),
            "RSA-SHA512" => Ok(SignatureAlgorithm::RsaSha512),
            "DSA-SHA1" => Ok(SignatureAlgorithm::DsaSha1),
            "ECDSA-SHA256" => Ok(SignatureAlgorithm::EcdsaSha256),
            "ECDSA-SHA384" => Ok(SignatureAlgorithm::EcdsaSha384),
            "ECDSA-SHA512" => Ok(SignatureAlgorithm::EcdsaSha512),
            _ => Err(Error::Config(format!("Unknown signature algorithm: {s}"))),
        }
    }
}

/// Identity used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account: String,
    pub subuser: Option<String>,
    /// Key fingerprint, e.g. `a1:b2:...`
    pub key_id: String,
    /// PEM-encoded private key
    pub private_key: String,
    pub algorithm: SignatureAlgorithm,
}

impl Credential {
    /// `/<account>[/<subuser>]/keys/<fingerprint>`
    pub fn key_id_path(&self) -> String {
        match &self.subuser {
            Some(sub) => format!("/{}/{}/keys/{}", self.account, sub, self.key_id),
            None => format!("/{}/keys/{}", self.account, self.key_id),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("subuser", &self.subuser)
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub credential: Credential,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub tls_insecure: bool,
}

impl ClientConfig {
    /// Home directory of the configured account, e.g. `/acct/stor`
    pub fn home(&self) -> String {
        format!("/{}/stor", self.credential.account)
    }
}

/// One source of partial settings
///
/// The same shape is used for explicit overrides, the environment and the
/// profile file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subuser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_insecure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Backoff>,
}

impl ConfigLayer {
    /// Read the `MANTA_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Read the `MANTA_*` variables through a lookup function
    ///
    /// Empty values count as unset.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            url: get(ENV_URL),
            user: get(ENV_USER),
            subuser: get(ENV_SUBUSER),
            key_id: get(ENV_KEY_ID),
            key_path: get(ENV_KEY_PATH).map(PathBuf::from),
            key_content: get(ENV_KEY_CONTENT),
            signature_algorithm: get(ENV_SIGNATURE_ALGORITHM),
            timeout_ms: get(ENV_TIMEOUT)
                .map(|v| parse_number(ENV_TIMEOUT, &v))
                .transpose()?,
            retries: get(ENV_RETRIES)
                .map(|v| parse_number(ENV_RETRIES, &v))
                .transpose()?,
            tls_insecure: get(ENV_TLS_INSECURE)
                .map(|v| parse_bool(ENV_TLS_INSECURE, &v))
                .transpose()?,
            backoff: None,
        })
    }

    /// Field-wise fallback: values in `self` win over `lower`
    ///
    /// The key source moves as a pair: a layer setting either `key_path` or
    /// `key_content` hides both fields of the lower layer.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        let (key_path, key_content) = if self.key_path.is_some() || self.key_content.is_some() {
            (self.key_path, self.key_content)
        } else {
            (lower.key_path, lower.key_content)
        };

        ConfigLayer {
            url: self.url.or(lower.url),
            user: self.user.or(lower.user),
            subuser: self.subuser.or(lower.subuser),
            key_id: self.key_id.or(lower.key_id),
            key_path,
            key_content,
            signature_algorithm: self.signature_algorithm.or(lower.signature_algorithm),
            timeout_ms: self.timeout_ms.or(lower.timeout_ms),
            retries: self.retries.or(lower.retries),
            tls_insecure: self.tls_insecure.or(lower.tls_insecure),
            backoff: self.backoff.or(lower.backoff),
        }
    }

    /// Apply defaults and validate
    ///
    /// `home` is used for the default key path `~/.ssh/id_rsa`.
    pub fn into_config(self, home: Option<&Path>) -> Result<ClientConfig> {
        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());
        let endpoint =
            Url::parse(&url).map_err(|e| Error::Config(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported URL scheme '{}'",
                endpoint.scheme()
            )));
        }

        let account = self
            .user
            .ok_or_else(|| Error::Config(format!("Account is not set (set {ENV_USER})")))?;
        let key_id = self
            .key_id
            .ok_or_else(|| Error::Config(format!("Key id is not set (set {ENV_KEY_ID})")))?;

        let algorithm = match self.signature_algorithm {
            Some(name) => name.parse()?,
            None => SignatureAlgorithm::default(),
        };

        let private_key = match self.key_content {
            Some(content) => content,
            None => {
                let path = match self.key_path {
                    Some(p) => p,
                    None => home
                        .map(|h| h.join(".ssh").join("id_rsa"))
                        .ok_or_else(|| {
                            Error::Config(format!(
                                "No private key configured (set {ENV_KEY_PATH} or {ENV_KEY_CONTENT})"
                            ))
                        })?,
                };
                std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!(
                        "Failed to read private key {}: {e}",
                        path.display()
                    ))
                })?
            }
        };

        let max_retries = self.retries.unwrap_or(DEFAULT_RETRIES);
        if max_retries > MAX_RETRIES {
            return Err(Error::Config(format!(
                "Retry count {max_retries} exceeds the maximum of {MAX_RETRIES}"
            )));
        }

        let retry = RetryPolicy {
            max_retries,
            backoff: self.backoff.unwrap_or_default(),
        };

        Ok(ClientConfig {
            endpoint,
            credential: Credential {
                account,
                subuser: self.subuser,
                key_id,
                private_key,
                algorithm,
            },
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            retry,
            tls_insecure: self.tls_insecure.unwrap_or(false),
        })
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a number, got '{value}'")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}

/// Loads and saves the profile file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use `$MANTA_CONFIG_DIR` or the platform config directory
    pub fn new() -> Result<Self> {
        let dir = match std::env::var(ENV_CONFIG_DIR) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .map(|d| d.join("manta"))
                .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?,
        };
        Ok(Self::with_dir(dir))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: dir.into().join(CONFIG_FILE_NAME),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the profile, an absent file is an empty layer
    pub fn load(&self) -> Result<ConfigLayer> {
        if !self.config_path.exists() {
            return Ok(ConfigLayer::default());
        }
        let content = std::fs::read_to_string(&self.config_path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse {}: {e}",
                self.config_path.display()
            ))
        })
    }

    pub fn save(&self, layer: &ConfigLayer) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(layer)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}

/// Resolve a configuration from explicit values, the environment, the
/// profile file and defaults
pub fn resolve(explicit: ConfigLayer) -> Result<ClientConfig> {
    let env = ConfigLayer::from_env()?;
    let file = ConfigManager::new()?.load()?;
    let home = dirs::home_dir();
    let config = explicit.or(env).or(file).into_config(home.as_deref())?;
    tracing::debug!(
        endpoint = %config.endpoint,
        account = %config.credential.account,
        algorithm = %config.credential.algorithm,
        "Resolved client configuration"
    );
    Ok(config)
}
