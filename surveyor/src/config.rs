//! Account-scoped advisory configuration and transport connection options.

use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::observability::events;

const COMPONENT: &str = "config";

/// Errors raised while loading an [`AdvisoryConfig`].
pub enum ConfigError {
    /// The configuration source could not be read.
    Read { path: String, source: io::Error },
    /// The configuration source is not a valid JSON document.
    Parse {
        source_id: String,
        source: serde_json::Error,
    },
    /// The document decoded but a required field is missing.
    Invalid { source_id: String, reason: String },
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Read({path:?}, {source:?})")
            }
            ConfigError::Parse { source_id, source } => {
                write!(f, "Parse({source_id:?}, {source:?})")
            }
            ConfigError::Invalid { source_id, reason } => {
                write!(f, "Invalid({source_id:?}, {reason:?})")
            }
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => write!(f, "open {path}: {source}"),
            ConfigError::Parse { source_id, source } => {
                write!(
                    f,
                    "invalid JetStream advisory configuration: {source_id}: {source}"
                )
            }
            ConfigError::Invalid { source_id, reason } => {
                write!(
                    f,
                    "invalid JetStream advisory configuration: {source_id}: {reason}"
                )
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Advisory listening scope for one account.
///
/// Credential fields are optional; when present they are overlaid onto the
/// host's [`ConnectionOptions`] by [`ConnectionOptions::for_account`].
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdvisoryConfig {
    #[serde(deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub jwt: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub seed: String,
    #[serde(rename = "credential")]
    #[serde(deserialize_with = "null_as_empty")]
    pub credentials: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub nkey: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tls_ca: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tls_cert: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub tls_key: String,
}

/// JSON `null` reads as an absent value, so it decodes like a missing field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Debug for AdvisoryConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisoryConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl AdvisoryConfig {
    /// Reads and validates the configuration document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source_id = path.display().to_string();

        let data = fs::read(path).map_err(|source| ConfigError::Read {
            path: source_id.clone(),
            source,
        })?;

        Self::from_slice(&source_id, &data)
    }

    /// Decodes and validates a configuration document from raw bytes.
    ///
    /// `source_id` only names the source in error messages.
    pub fn from_slice(source_id: &str, data: &[u8]) -> Result<Self, ConfigError> {
        let config: AdvisoryConfig =
            serde_json::from_slice(data).map_err(|source| ConfigError::Parse {
                source_id: source_id.to_string(),
                source,
            })?;

        config.validate(source_id)?;

        debug!(
            event = events::CONFIG_LOADED,
            component = COMPONENT,
            source_id,
            account = %config.name,
            "loaded advisory configuration"
        );

        Ok(config)
    }

    pub fn validate(&self, source_id: &str) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid {
                source_id: source_id.to_string(),
                reason: "name is required".to_string(),
            });
        }

        Ok(())
    }

    /// Stable identity of this scope: `id` when set, otherwise the account name.
    pub fn id(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    pub fn account(&self) -> &str {
        &self.name
    }
}

/// Transport connection parameters, opaque to the advisory core.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub urls: Vec<String>,
    pub name: String,
    pub username: String,
    pub password: String,
    pub jwt: String,
    pub seed: String,
    pub credentials: String,
    pub nkey: String,
    pub tls_ca: String,
    pub tls_cert: String,
    pub tls_key: String,
}

impl Debug for ConnectionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("urls", &self.urls)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn overlay(base: &mut String, account_value: &str) {
    if !account_value.is_empty() {
        *base = account_value.to_string();
    }
}

impl ConnectionOptions {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            name: "NATS_Surveyor".to_string(),
            ..Default::default()
        }
    }

    /// Returns a copy of these options with the account's credentials and TLS
    /// material applied. Non-empty account values win.
    pub fn for_account(&self, config: &AdvisoryConfig) -> Self {
        let mut options = self.clone();

        options.name = if self.name.is_empty() {
            config.id().to_string()
        } else {
            format!("{} ({})", self.name, config.id())
        };
        overlay(&mut options.username, &config.username);
        overlay(&mut options.password, &config.password);
        overlay(&mut options.jwt, &config.jwt);
        overlay(&mut options.seed, &config.seed);
        overlay(&mut options.credentials, &config.credentials);
        overlay(&mut options.nkey, &config.nkey);
        overlay(&mut options.tls_ca, &config.tls_ca);
        overlay(&mut options.tls_cert, &config.tls_cert);
        overlay(&mut options.tls_key, &config.tls_key);

        options
    }
}
