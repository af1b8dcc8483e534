use crate::error::{IoContext, MosaicError, Result};
use crate::types::SourceFile;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Filesystem operations the build orchestrator depends on.
pub trait Filesystem {
    fn is_directory(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents.
    fn make_directory(&self, path: &Path, mode: u32) -> Result<()>;

    /// Removes everything inside `path`, keeping the directory itself.
    fn clean_directory(&self, path: &Path) -> Result<()>;

    /// Removes `path` and its contents. A missing directory is not an error.
    fn delete_directory(&self, path: &Path) -> Result<()>;

    /// Every file below `root`, recursively, in a stable order.
    fn all_files(&self, root: &Path) -> Result<Vec<SourceFile>>;

    /// Creates or overwrites the file at `path`.
    fn put(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn make_directory(&self, path: &Path, mode: u32) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(path).io_context("creating directory", path)
    }

    fn clean_directory(&self, path: &Path) -> Result<()> {
        for entry in fs::read_dir(path).io_context("reading directory", path)? {
            let entry = entry.io_context("reading directory", path)?;
            let entry_path = entry.path();
            let file_type = entry
                .file_type()
                .io_context("reading metadata of", &entry_path)?;

            if file_type.is_dir() {
                fs::remove_dir_all(&entry_path).io_context("removing directory", &entry_path)?;
            } else {
                fs::remove_file(&entry_path).io_context("removing file", &entry_path)?;
            }
        }

        Ok(())
    }

    fn delete_directory(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Ok(());
        }
        fs::remove_dir_all(path).io_context("removing directory", path)
    }

    fn all_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry))
        {
            let entry = entry.map_err(|error| MosaicError::WalkDir {
                path: root.to_path_buf(),
                message: error.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            files.push(SourceFile::new(root, entry.path())?);
        }

        Ok(files)
    }

    fn put(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).io_context("writing", path)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_make_directory_is_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");

        LocalFilesystem
            .make_directory(&nested, DEFAULT_DIR_MODE)
            .unwrap();

        assert!(LocalFilesystem.is_directory(&nested));
    }

    #[test]
    fn test_clean_directory_keeps_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/deeper/file.txt"), "x").unwrap();
        fs::write(dir.path().join("top.txt"), "y").unwrap();

        LocalFilesystem.clean_directory(dir.path()).unwrap();

        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_directory_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        LocalFilesystem.delete_directory(&missing).unwrap();
        assert!(!missing.exists());
    }

    #[test]
    fn test_delete_directory_removes_contents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("scratch");
        fs::create_dir_all(target.join("inner")).unwrap();
        fs::write(target.join("inner/file"), "z").unwrap();

        LocalFilesystem.delete_directory(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_all_files_sorted_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("zebra.md"), "").unwrap();
        fs::write(dir.path().join("about.md"), "").unwrap();
        fs::write(dir.path().join("blog/post.md"), "").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "").unwrap();

        let files = LocalFilesystem.all_files(dir.path()).unwrap();
        let paths: Vec<&str> = files
            .iter()
            .map(|file| file.relative_path.as_str())
            .collect();

        assert_eq!(paths, vec!["about.md", "blog/post.md", "zebra.md"]);
    }

    #[test]
    fn test_all_files_missing_root_errors() {
        let dir = TempDir::new().unwrap();
        let result = LocalFilesystem.all_files(&dir.path().join("missing"));
        assert!(matches!(result, Err(MosaicError::WalkDir { .. })));
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.html");

        LocalFilesystem.put(&path, b"first").unwrap();
        LocalFilesystem.put(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
