use crate::error::{IoContext, MosaicError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A file discovered under the source root.
///
/// Relative paths always use `/` separators so metadata keys and target paths
/// are identical on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub relative_dir: String,
    pub filename: String,
    pub extension: String,
    pub modified: DateTime<Utc>,
}

impl SourceFile {
    pub fn new(root: &Path, path: &Path) -> Result<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| MosaicError::InvalidPath {
                path: path.to_path_buf(),
            })?;

        let filename = relative
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| MosaicError::InvalidPath {
                path: path.to_path_buf(),
            })?;

        let relative_dir = relative
            .parent()
            .map(normalize_separators)
            .unwrap_or_default();

        let extension = relative
            .extension()
            .map(|extension| extension.to_string_lossy().to_string())
            .unwrap_or_default();

        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .io_context("reading metadata of", path)?;

        Ok(Self {
            path: path.to_path_buf(),
            relative_path: normalize_separators(relative),
            relative_dir,
            filename,
            extension,
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// The filename with `suffix` removed, if the filename ends with it.
    pub fn strip_suffix(&self, suffix: &str) -> Option<&str> {
        self.filename
            .strip_suffix(suffix)
            .filter(|stem| !stem.is_empty())
    }

    /// The filename without its last extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.filename)
    }
}

fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Output of a single handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub filename: String,
    pub relative_dir: String,
    pub contents: Vec<u8>,
}

impl ProcessedFile {
    pub fn new(
        filename: impl Into<String>,
        relative_dir: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            relative_dir: relative_dir.into(),
            contents: contents.into(),
        }
    }
}

/// Per-file record in the site-wide metadata index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMeta {
    pub path: String,
    #[serde(rename = "target-path")]
    pub target_path: String,
    pub last_modified: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileMeta {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|value| value.as_str().map(String::from))
    }
}

/// Site-wide metadata keyed by source relative path, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SiteMeta {
    entries: BTreeMap<String, FileMeta>,
}

impl SiteMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, meta: FileMeta) {
        self.entries.insert(meta.path.clone(), meta);
    }

    pub fn get(&self, path: &str) -> Option<&FileMeta> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileMeta)> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

pub fn default_pretty() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_file_nested() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("blog/2024")).unwrap();
        let path = dir.path().join("blog/2024/hello.md");
        fs::write(&path, "# Hello").unwrap();

        let file = SourceFile::new(dir.path(), &path).unwrap();

        assert_eq!(file.relative_path, "blog/2024/hello.md");
        assert_eq!(file.relative_dir, "blog/2024");
        assert_eq!(file.filename, "hello.md");
        assert_eq!(file.extension, "md");
        assert_eq!(file.stem(), "hello");
    }

    #[test]
    fn test_source_file_at_root_has_empty_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.tera");
        fs::write(&path, "hi").unwrap();

        let file = SourceFile::new(dir.path(), &path).unwrap();

        assert_eq!(file.relative_dir, "");
        assert_eq!(file.relative_path, "index.tera");
        assert_eq!(file.strip_suffix(".tera"), Some("index"));
    }

    #[test]
    fn test_source_file_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let path = other.path().join("stray.md");
        fs::write(&path, "").unwrap();

        let result = SourceFile::new(root.path(), &path);
        assert!(matches!(result, Err(MosaicError::InvalidPath { .. })));
    }

    #[test]
    fn test_file_meta_serializes_target_path_with_dash() {
        let mut extra = Map::new();
        extra.insert("title".to_string(), Value::from("About"));
        let meta = FileMeta {
            path: "about.md".to_string(),
            target_path: "about/index.html".to_string(),
            last_modified: Value::from(1_700_000_000),
            extra,
        };

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["target-path"], "about/index.html");
        assert_eq!(value["title"], "About");
        assert_eq!(meta.get_string("title"), Some("About".to_string()));
    }

    #[test]
    fn test_build_options_default_is_pretty() {
        assert!(BuildOptions::default().pretty);
        let parsed: BuildOptions = toml::from_str("").unwrap();
        assert!(parsed.pretty);
    }
}
