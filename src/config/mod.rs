//! Resolver configuration.
//!
//! The resolver needs exactly three settings, addressed by dotted key:
//!
//! | Key                           | Type   | Default | Meaning                                  |
//! |-------------------------------|--------|---------|------------------------------------------|
//! | `global.dir.root`             | string | none    | project root holding `vendor/eureka/...` |
//! | `global.cache.static.enabled` | bool   | `false` | write a copy of every served asset       |
//! | `global.cache.static.path`    | string | none    | cache root; required when enabled        |
//!
//! ```toml
//! [global.dir]
//! root = "/app"
//!
//! [global.cache.static]
//! enabled = true
//! path = "/app/var/cache"
//! ```

use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable prefix, e.g. `ASSETS__GLOBAL__DIR__ROOT=/app`.
const ENV_PREFIX: &str = "ASSETS";

/// Validated resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Project root; assets resolve under `<root>/vendor/eureka`.
    pub root_dir: PathBuf,
    /// Cache root when `global.cache.static.enabled` is set, `None` otherwise.
    pub static_cache: Option<PathBuf>,
}

impl AssetConfig {
    /// Configuration with caching disabled.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            static_cache: None,
        }
    }

    /// Enables the static cache, writing under `path`.
    #[must_use]
    pub fn with_static_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_cache = Some(path.into());
        self
    }

    /// Load configuration from a file, overlaid with `ASSETS__*` environment
    /// variables.
    ///
    /// The file format is picked from the extension (`.toml`, `.json`,
    /// `.yaml`, ...); the extension may be omitted.
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref().to_string_lossy();
        let settings = config::Config::builder()
            .add_source(File::with_name(&config_path).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("global.cache.static.enabled", false)?
            .build()?;

        Self::from_settings(settings)
    }

    /// Deserialize and validate an already assembled [`config::Config`].
    pub fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = settings.try_deserialize()?;
        raw.try_into()
    }

    pub fn cache_enabled(&self) -> bool {
        self.static_cache.is_some()
    }
}

// Mirrors the dotted key layout; flattened into `AssetConfig` after validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    global: RawGlobal,
}

#[derive(Debug, Deserialize)]
struct RawGlobal {
    dir: RawDir,
    #[serde(default)]
    cache: RawCache,
}

#[derive(Debug, Deserialize)]
struct RawDir {
    root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct RawCache {
    #[serde(rename = "static", default)]
    static_files: RawStaticCache,
}

#[derive(Debug, Default, Deserialize)]
struct RawStaticCache {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    path: Option<PathBuf>,
}

impl TryFrom<RawSettings> for AssetConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let RawStaticCache { enabled, path } = raw.global.cache.static_files;
        let static_cache = match (enabled, path) {
            (false, _) => None,
            (true, Some(path)) if !path.as_os_str().is_empty() => Some(path),
            (true, _) => {
                return Err(ConfigError::Message(
                    "global.cache.static.path is required when global.cache.static.enabled is true"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            root_dir: raw.global.dir.root,
            static_cache,
        })
    }
}
