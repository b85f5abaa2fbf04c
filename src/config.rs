// src/config.rs
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cache;
use crate::errors::{RelayError, Result};

/// Where registrations are forwarded and how the outbound client is set up.
#[derive(Deserialize, Debug, Clone)]
pub struct RemoteConfig {
    pub api_base: String,

    #[serde(default = "default_users_path")]
    pub users_path: String,

    /// Sent as a bearer token on every outbound request when present.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Client-side timeout. Unset means the remote alone decides how long a call takes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CacheConfig {
    /// Cached views also expire after this many seconds, on top of explicit invalidation.
    #[serde(default)]
    pub ttl_secs: Option<u64>,

    /// Upper bound on cached views; the oldest is dropped to make room.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

/// High-level application configuration, loaded from the environment or a TOML file.
#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_users_path() -> String {
    "/users".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    /// Reads the file named by `SIGNUP_RELAY_CONFIG` if set, otherwise the environment.
    pub fn load() -> Result<Self> {
        match std::env::var("SIGNUP_RELAY_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_base = std::env::var("REMOTE_API_BASE").map_err(|_| {
            RelayError::Config(
                "No remote API configured. Please set REMOTE_API_BASE.".to_string(),
            )
        })?;

        let remote = RemoteConfig {
            api_base,
            users_path: std::env::var("REMOTE_USERS_PATH").unwrap_or_else(|_| default_users_path()),
            api_token: std::env::var("REMOTE_API_TOKEN").ok(),
            timeout_secs: parse_env("REMOTE_TIMEOUT_SECS")?,
            default_headers: BTreeMap::new(),
        };

        let server = ServerConfig {
            host: std::env::var("BIND_HOST").unwrap_or_else(|_| default_host()),
            port: parse_env("BIND_PORT")?.unwrap_or_else(default_port),
        };

        let cache = CacheConfig {
            ttl_secs: parse_env("VIEW_CACHE_TTL_SECS")?,
            max_entries: parse_env("VIEW_CACHE_MAX_ENTRIES")?,
        };

        let mut config = AppConfig { remote, server, cache };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values and normalises the remote base address in place.
    fn validate(&mut self) -> Result<()> {
        self.remote.api_base = self.remote.api_base.trim().to_string();
        let base = &self.remote.api_base;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(RelayError::Config(format!(
                "remote.api_base must be an http(s) URL, got '{}'",
                base
            )));
        }
        if !self.remote.users_path.starts_with('/') {
            return Err(RelayError::Config(format!(
                "remote.users_path must start with '/', got '{}'",
                self.remote.users_path
            )));
        }
        if let Some(secs) = self.cache.ttl_secs {
            if cache::ttl_from_secs(secs).is_none() {
                return Err(RelayError::Config(format!(
                    "cache.ttl_secs is out of range: {}",
                    secs
                )));
            }
        }
        if self.cache.max_entries == Some(0) {
            return Err(RelayError::Config(
                "cache.max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RelayError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}
