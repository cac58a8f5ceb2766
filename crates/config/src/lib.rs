//! Configuration for the trove browser.
//!
//! Sources are merged in order, later ones winning:
//! 1. built-in defaults,
//! 2. a config file (TOML, YAML or JSON, picked by extension),
//! 3. `TROVE_` environment variables, with `__` separating nested keys
//!    (e.g. `TROVE_LIBRARY__ROOT=/srv/archive`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "TROVE_";
const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_DATABASE_FILE: &str = "trove.sqlite";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "trove")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Absolute path to the archive root. Required.
    pub root: PathBuf,
    /// Backend name, used in logs.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON series catalog. Without one every series lookup comes back empty.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.data_dir().join(DEFAULT_DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE));
        Self {
            library: LibraryConfig { root: PathBuf::new(), name: "local".to_string() },
            database: DatabaseConfig { path: database },
            catalog: CatalogConfig::default(),
            log: LogConfig { level: "info".to_string(), format: LogFormat::default() },
        }
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
    }

    /// Load and validate configuration.
    ///
    /// An explicitly given file must exist. Without one, the default location
    /// is used if a file exists there.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Load(format!("config file not found: {}", path.display())))
            },
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file().filter(|path| path.is_file()),
        };
        let figment = Self::figment(file.as_deref())?.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Defaults merged with a config file, without environment variables.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let Some(path) = file else {
            return Ok(figment);
        };
        tracing::debug!(path = %path.display(), "reading configuration file");
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::Load(format!("unsupported config format: {}", path.display()))),
        })
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load("malformed configuration".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let root = &self.library.root;
        if root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("library.root must be set".to_string()));
        }
        if !root.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!("library.root must be absolute: {}", root.display())));
        }
        if !root.is_dir() {
            exn::bail!(ErrorKind::Invalid(format!("library.root is not a directory: {}", root.display())));
        }
        if self.library.name.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("library.name must not be empty".to_string()));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path must be set".to_string()));
        }
        Ok(())
    }
}
