use crate::error::{IoContext, MosaicError, Result};
use crate::parsing::toml_to_json;
use crate::site::DEFAULT_CACHE_DIR;
use crate::types::{BuildOptions, default_pretty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mosaic.toml";
pub const DEFAULT_ENVIRONMENT: &str = "local";
const BUILD_TABLE: &str = "build";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default)]
    pub destination: Option<PathBuf>,
    #[serde(default = "default_cache")]
    pub cache: PathBuf,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            destination: None,
            cache: default_cache(),
            pretty: default_pretty(),
        }
    }
}

pub fn default_source() -> PathBuf {
    PathBuf::from("source")
}

pub fn default_cache() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

/// Project configuration for one environment.
///
/// `mosaic.toml` is read first and `mosaic.<environment>.toml`, when present,
/// is merged over it table by table. The `[build]` table configures the
/// pipeline; every other key is a template variable.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    pub environment: String,
    pub build: BuildConfig,
    pub variables: Map<String, Value>,
}

impl SiteConfig {
    pub fn load(root: impl AsRef<Path>, environment: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Err(MosaicError::ConfigNotFound { path: config_path });
        }

        let mut table = read_table(&config_path)?;

        let overlay_path = root.join(environment_file(environment));
        if overlay_path.exists() {
            merge_tables(&mut table, read_table(&overlay_path)?);
        }

        let build = match table.remove(BUILD_TABLE) {
            Some(value) => value
                .try_into::<BuildConfig>()
                .map_err(|error| MosaicError::TomlParse {
                    path: config_path.clone(),
                    message: error.to_string(),
                })?,
            None => BuildConfig::default(),
        };

        let variables = table
            .into_iter()
            .map(|(key, value)| (key, toml_to_json(value)))
            .collect();

        Ok(Self {
            root,
            environment: environment.to_string(),
            build,
            variables,
        })
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.build.source)
    }

    /// `build_<environment>` unless configured otherwise.
    pub fn destination_dir(&self) -> PathBuf {
        match &self.build.destination {
            Some(destination) => self.root.join(destination),
            None => self.root.join(format!("build_{}", self.environment)),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.build.cache)
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            pretty: self.build.pretty,
        }
    }

    /// Files whose change should trigger a rebuild of this environment.
    pub fn config_files(&self) -> Vec<PathBuf> {
        vec![
            self.root.join(CONFIG_FILE),
            self.root.join(environment_file(&self.environment)),
        ]
    }
}

fn environment_file(environment: &str) -> String {
    format!("mosaic.{}.toml", environment)
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path).io_context("reading config", path)?;
    toml::from_str(&content).map_err(|error| MosaicError::TomlParse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, toml::Value::Table(incoming));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
