use crate::api::{Credentials, ODataRequest, TransportConfig};
use crate::api::constants::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT};
use crate::naming::{CachedPluralizer, DEFAULT_PATTERN, Homogenizer, MatchResolver, SchemaNameMatcher, SimplePluralizer};
use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const ENV_SERVICE_URL: &str = "ODATA_SERVICE_URL";
pub const ENV_USERNAME: &str = "ODATA_USERNAME";
pub const ENV_PASSWORD: &str = "ODATA_PASSWORD";
pub const ENV_BEARER_TOKEN: &str = "ODATA_BEARER_TOKEN";

/// Settings that are syntactically valid TOML but cannot be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid homogenize pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No service URL configured (set ODATA_SERVICE_URL)")]
    MissingServiceUrl,

    #[error("Invalid service URL '{url}': {reason}")]
    InvalidServiceUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingSettings {
    #[serde(default)]
    pub resolver: MatchResolver,
    #[serde(default = "default_homogenize_pattern")]
    pub homogenize_pattern: String,
    #[serde(default = "default_true")]
    pub cache_pluralizer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSettings {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
    #[serde(default = "default_accept")]
    pub accept: Vec<String>,
    #[serde(default)]
    pub check_optimistic_concurrency: bool,
    #[serde(default = "default_true")]
    pub return_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub naming: NamingSettings,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub request: RequestSettings,
}

fn default_homogenize_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept() -> Vec<String> {
    vec![DEFAULT_ACCEPT.to_string()]
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            resolver: MatchResolver::default(),
            homogenize_pattern: default_homogenize_pattern(),
            cache_pluralizer: true,
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
        }
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            accept: default_accept(),
            check_optimistic_concurrency: false,
            return_content: true,
        }
    }
}

impl RequestSettings {
    /// Fill whatever the request left unset from these defaults
    pub fn apply(&self, mut request: ODataRequest) -> ODataRequest {
        if request.accept().is_empty() {
            for media_type in &self.accept {
                request = request.with_accept(media_type.clone());
            }
        }
        if !request.has_optimistic_concurrency() {
            request = request.with_optimistic_concurrency(self.check_optimistic_concurrency);
        }
        if !request.has_return_content() {
            request = request.with_return_content(self.return_content);
        }
        request
    }
}

impl Settings {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("odata-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".odata-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from: {:?}", path);

        if !path.exists() {
            info!("Settings file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        debug!("Loaded settings with {} resolver", settings.naming.resolver);
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving settings to: {:?}", path);

        let content = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", path))?;

        info!("Settings saved successfully");
        Ok(())
    }

    pub fn set_resolver(&mut self, resolver: MatchResolver) {
        info!("Setting name resolver to: {}", resolver);
        self.naming.resolver = resolver;
    }

    /// Build the matcher described by `[naming]`
    pub fn name_matcher(&self) -> Result<SchemaNameMatcher, ConfigError> {
        let homogenizer = Homogenizer::with_pattern(&self.naming.homogenize_pattern).map_err(|source| {
            ConfigError::InvalidPattern {
                pattern: self.naming.homogenize_pattern.clone(),
                source,
            }
        })?;

        let matcher = if self.naming.cache_pluralizer {
            SchemaNameMatcher::with_parts(
                self.naming.resolver,
                Arc::new(homogenizer),
                Arc::new(CachedPluralizer::new(SimplePluralizer::new())),
            )
        } else {
            SchemaNameMatcher::with_parts(
                self.naming.resolver,
                Arc::new(homogenizer),
                Arc::new(SimplePluralizer::new()),
            )
        };

        Ok(matcher)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.transport.timeout_secs.map(Duration::from_secs),
            connect_timeout: Duration::from_secs(self.transport.connect_timeout_secs),
            user_agent: self.transport.user_agent.clone(),
            accept_invalid_certs: self.transport.accept_invalid_certs,
        }
    }
}

/// Where to send requests and as whom, read from the environment
#[derive(Debug, Clone)]
pub struct ServiceConnection {
    pub service_url: Url,
    pub credentials: Option<Credentials>,
}

impl ServiceConnection {
    /// Read the connection from the process environment, loading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank variables count as unset
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw = lookup(ENV_SERVICE_URL).ok_or(ConfigError::MissingServiceUrl)?;

        // A trailing slash keeps relative paths below the service root on join
        let normalized = if raw.ends_with('/') {
            raw.clone()
        } else {
            format!("{}/", raw)
        };
        let service_url = Url::parse(&normalized)
            .map_err(|e| ConfigError::InvalidServiceUrl {
                url: raw,
                reason: e.to_string(),
            })?;

        let credentials = match (lookup(ENV_BEARER_TOKEN), lookup(ENV_USERNAME)) {
            (Some(token), _) => Some(Credentials::bearer(token)),
            (None, Some(username)) => Some(Credentials::Basic {
                username,
                password: lookup(ENV_PASSWORD),
            }),
            (None, None) => None,
        };

        Ok(Self {
            service_url,
            credentials,
        })
    }

    /// Resolve `target` against the service root; absolute URLs pass through
    pub fn url_for(&self, target: &str) -> Result<Url, ConfigError> {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }
        self.service_url
            .join(target.trim_start_matches('/'))
            .map_err(|e| ConfigError::InvalidServiceUrl {
                url: target.to_string(),
                reason: e.to_string(),
            })
    }
}
