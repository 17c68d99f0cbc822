//! # Configuration
//!
//! Layered settings for the Symmetria binary:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`, or `symmetria.toml` in the working
//!    directory when present)
//! 3. Environment (`SYMMETRIA_HOST`, `SYMMETRIA_PORT`, `SYMMETRIA_LEVELS_DIR`,
//!    `SYMMETRIA_RATE_LIMIT`)
//! 4. CLI flags, applied by the caller
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100
//!
//! [levels]
//! dir = "levels"
//!
//! [bridge]
//! poll_interval_ms = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use symmetria_core::SymmetriaError;

/// File picked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "symmetria.toml";

/// Maximum size of the config file itself.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub levels: LevelsConfig,
    pub bridge: BridgeConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second; `0` disables rate limiting.
    pub rate_limit: u32,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: 100,
            body_limit_bytes: 256 * 1024,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[levels]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelsConfig {
    /// Directory of `*.json` level files merged over the built-in catalog.
    pub dir: Option<PathBuf>,
    pub max_file_bytes: u64,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_file_bytes: 1024 * 1024,
        }
    }
}

/// `[bridge]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Poll interval of the request file in follow mode.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, SymmetriaError> {
        toml::from_str(content)
            .map_err(|e| SymmetriaError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SymmetriaError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            SymmetriaError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SymmetriaError::SerializationError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SymmetriaError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SymmetriaError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment values read through `lookup`. Unparseable
    /// numbers are ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SYMMETRIA_HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("SYMMETRIA_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SYMMETRIA_PORT '{}'", port),
            }
        }
        if let Some(limit) = lookup("SYMMETRIA_RATE_LIMIT") {
            match limit.parse() {
                Ok(limit) => self.server.rate_limit = limit,
                Err(_) => tracing::warn!("Ignoring invalid SYMMETRIA_RATE_LIMIT '{}'", limit),
            }
        }
        if let Some(dir) = lookup("SYMMETRIA_LEVELS_DIR").filter(|d| !d.is_empty()) {
            self.levels.dir = Some(PathBuf::from(dir));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
