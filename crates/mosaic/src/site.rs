use crate::error::{MosaicError, Result};
use crate::filesystem::{DEFAULT_DIR_MODE, Filesystem, LocalFilesystem};
use crate::handlers::{Handler, HandlerRegistry, RenderContext, SiteContext};
use crate::meta::collect_site_meta;
use crate::paths::resolve_output_path;
use crate::types::{BuildOptions, SiteMeta, SourceFile};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_DIR: &str = "_tmp";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Target paths written, relative to the destination, in discovery order.
    pub written: Vec<String>,
    /// Source paths no handler claimed.
    pub skipped: Vec<String>,
    /// Target paths written by more than one source; the last source wins.
    pub overwritten: Vec<String>,
}

/// Drives a full build: prepare, discover, collect metadata, render, clean up.
pub struct SiteBuilder<F: Filesystem = LocalFilesystem> {
    files: F,
    cache_path: PathBuf,
    registry: HandlerRegistry,
    options: BuildOptions,
    meta: SiteMeta,
}

impl SiteBuilder<LocalFilesystem> {
    pub fn new(cache_path: impl AsRef<Path>) -> Self {
        Self::with_filesystem(LocalFilesystem, cache_path)
    }
}

impl<F: Filesystem> SiteBuilder<F> {
    pub fn with_filesystem(files: F, cache_path: impl AsRef<Path>) -> Self {
        Self {
            files,
            cache_path: cache_path.as_ref().to_path_buf(),
            registry: HandlerRegistry::new(),
            options: BuildOptions::default(),
            meta: SiteMeta::new(),
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn handlers(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn register_handler(&mut self, handler: impl Handler + 'static) {
        self.registry.register(handler);
    }

    pub fn build_options(&self) -> &BuildOptions {
        &self.options
    }

    /// Metadata from the most recent build.
    pub fn site_meta(&self) -> &SiteMeta {
        &self.meta
    }

    /// Rebuilds `dest` from `source`. The destination is emptied first, and
    /// the scratch directory is removed afterwards whether or not the build
    /// succeeded. Output written before a failure is left in place.
    pub fn build(
        &mut self,
        source: &Path,
        dest: &Path,
        variables: &Map<String, Value>,
    ) -> Result<BuildReport> {
        let result = self
            .prepare_directories(dest)
            .and_then(|()| self.build_site(source, dest, variables));
        let cleanup = self.cleanup();

        let report = result?;
        cleanup?;

        info!(
            "Built {} files from {} to {} ({} skipped)",
            report.written.len(),
            source.display(),
            dest.display(),
            report.skipped.len()
        );

        Ok(report)
    }

    fn prepare_directories(&self, dest: &Path) -> Result<()> {
        for directory in [self.cache_path.as_path(), dest] {
            self.prepare_directory(directory, true)?;
        }
        Ok(())
    }

    fn prepare_directory(&self, directory: &Path, clean: bool) -> Result<()> {
        if !self.files.is_directory(directory) {
            self.files.make_directory(directory, DEFAULT_DIR_MODE)?;
        }

        if clean {
            self.files.clean_directory(directory)?;
        }

        Ok(())
    }

    fn discover(&self, source: &Path) -> Result<Vec<SourceFile>> {
        let files = self.files.all_files(source)?;
        let total = files.len();

        let files: Vec<SourceFile> = files
            .into_iter()
            .filter(|file| !should_ignore(&file.relative_path))
            .collect();

        debug!(
            "Discovered {} files under {} ({} ignored)",
            files.len(),
            source.display(),
            total - files.len()
        );

        Ok(files)
    }

    fn build_site(
        &mut self,
        source: &Path,
        dest: &Path,
        variables: &Map<String, Value>,
    ) -> Result<BuildReport> {
        self.meta = SiteMeta::new();

        let files = self.discover(source)?;
        self.meta = collect_site_meta(&files, &self.registry, &self.options)?;
        if self.meta.is_empty() {
            warn!("Nothing to build under {}", source.display());
        }

        let mut report = BuildReport::default();
        let mut targets = BTreeSet::new();
        for file in &files {
            match self.build_file(file, dest, variables)? {
                Some(target) => {
                    if !targets.insert(target.clone()) {
                        warn!("{} overwrites {}", file.relative_path, target);
                        report.overwritten.push(target.clone());
                    }
                    report.written.push(target);
                }
                None => report.skipped.push(file.relative_path.clone()),
            }
        }

        Ok(report)
    }

    fn build_file(
        &self,
        file: &SourceFile,
        dest: &Path,
        variables: &Map<String, Value>,
    ) -> Result<Option<String>> {
        let Some(handler) = self.registry.resolve(file) else {
            return Ok(None);
        };

        let context = RenderContext {
            variables,
            site: SiteContext {
                meta: &self.meta,
                options: &self.options,
            },
        };

        let processed = handler.handle(file, &context)?;
        let output = resolve_output_path(
            &processed.relative_dir,
            &processed.filename,
            self.options.pretty,
        );

        if let Some(meta) = self.meta.get(&file.relative_path)
            && meta.target_path != output.path
        {
            return Err(MosaicError::TargetPathMismatch {
                handler: handler.name().to_string(),
                path: file.relative_path.clone(),
                expected: meta.target_path.clone(),
                actual: output.path,
            });
        }

        self.prepare_directory(&dest.join(&output.directory), false)?;
        self.files.put(&dest.join(&output.path), &processed.contents)?;

        debug!(
            "{} -> {} ({})",
            file.relative_path,
            output.path,
            handler.name()
        );

        Ok(Some(output.path))
    }

    fn cleanup(&self) -> Result<()> {
        self.files.delete_directory(&self.cache_path)
    }
}

/// Files under any `_`-prefixed path segment are partials, layouts or drafts
/// and are never published.
pub fn should_ignore(relative_path: &str) -> bool {
    relative_path
        .split('/')
        .any(|segment| segment.starts_with('_'))
}
