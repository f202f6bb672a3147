use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

/// Environment variable names accepted for compatibility with existing
/// deployments, and the config key each one feeds.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SUPABASE_URL", "storage.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "storage.service_key"),
    ("NOMINATIM_USER_AGENT", "geocoding.user_agent"),
    ("NOMINATIM_EMAIL", "geocoding.email"),
    ("PORT", "web.port"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub photos: PhotoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// Outbound geocoding (Nominatim) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub search_url: String,
    pub reverse_url: String,
    pub user_agent: String,
    /// Contact address appended as `email=` to every query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub accept_language: String,
    pub result_limit: u32,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// Sweep expired cache entries every N writes, 0 disables
    pub sweep_every: u64,
}

/// Remote object storage settings
///
/// `url` and `service_key` are secrets and have no defaults. Their absence
/// only disables photo uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,
    pub bucket: String,
    pub upload_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoConfig {
    pub max_upload_bytes: u64,
    pub max_width: u32,
    pub jpeg_quality: u8,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_GEO_SEARCH_URL.to_string(),
            reverse_url: DEFAULT_GEO_REVERSE_URL.to_string(),
            user_agent: DEFAULT_GEO_USER_AGENT.to_string(),
            email: None,
            accept_language: DEFAULT_GEO_ACCEPT_LANGUAGE.to_string(),
            result_limit: DEFAULT_GEO_RESULT_LIMIT,
            timeout_secs: DEFAULT_GEO_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_GEO_CACHE_TTL_SECS,
            sweep_every: DEFAULT_GEO_SWEEP_EVERY,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_width: DEFAULT_MAX_IMAGE_WIDTH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Contact email, if set to something other than blanks
    pub fn contact_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// User agent with surrounding whitespace removed, falling back to the
    /// built-in default when blank
    pub fn effective_user_agent(&self) -> &str {
        match self.user_agent.trim() {
            "" => DEFAULT_GEO_USER_AGENT,
            ua => ua,
        }
    }
}

impl StorageConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Base URL without trailing slashes, if configured
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn credential(&self) -> Option<&str> {
        self.service_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Layered configuration sources, lowest precedence first: built-in
    /// defaults, the TOML file, `CACAO_`-prefixed variables (`__` nests), and
    /// the legacy variable names.
    pub fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("CACAO_").split("__"))
            .merge(
                Env::raw()
                    .only(&LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect::<Vec<_>>())
                    .map(|name| {
                        LEGACY_ENV_KEYS
                            .iter()
                            .find(|(legacy, _)| name.as_str().eq_ignore_ascii_case(legacy))
                            .map(|(_, key)| *key)
                            .unwrap_or_else(|| name.as_str())
                            .to_string()
                            .into()
                    }),
            )
    }

    pub fn load(config_file: &str) -> Result<Self> {
        let config: Config = Self::figment(config_file).extract()?;
        config.validate()?;

        info!(
            "Configuration loaded: web={}:{}, storage configured={}",
            config.web.host,
            config.web.port,
            config.storage.base_url().is_some() && config.storage.credential().is_some()
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.photos.jpeg_quality) {
            bail!(
                "photos.jpeg_quality must be between 1 and 100, got {}",
                self.photos.jpeg_quality
            );
        }
        if self.photos.max_width == 0 {
            bail!("photos.max_width must be greater than zero");
        }
        if self.photos.max_upload_bytes == 0 {
            bail!("photos.max_upload_bytes must be greater than zero");
        }
        if self.geocoding.timeout_secs == 0 || self.storage.upload_timeout_secs == 0 {
            bail!("timeouts must be greater than zero");
        }
        Ok(())
    }
}
