//! First build pass: site-wide metadata.
//!
//! Every file's record is complete before any file is rendered, so a page can
//! read the metadata of files that come after it in discovery order.

use crate::error::Result;
use crate::handlers::{Handler, HandlerRegistry};
use crate::paths::resolve_output_path;
use crate::types::{BuildOptions, FileMeta, SiteMeta, SourceFile};
use log::warn;
use serde_json::Value;

pub const PATH_KEY: &str = "path";
pub const TARGET_PATH_KEY: &str = "target-path";
pub const LAST_MODIFIED_KEY: &str = "last_modified";

pub fn collect_site_meta(
    files: &[SourceFile],
    registry: &HandlerRegistry,
    options: &BuildOptions,
) -> Result<SiteMeta> {
    let mut site_meta = SiteMeta::new();

    for file in files {
        let Some(handler) = registry.resolve(file) else {
            warn!("No handler for {}, skipping", file.relative_path);
            continue;
        };

        site_meta.insert(file_meta(handler, file, options)?);
    }

    Ok(site_meta)
}

/// Builds one record. `path` and `target-path` always come from the build;
/// `last_modified` falls back to the file's mtime in Unix seconds.
pub fn file_meta(
    handler: &dyn Handler,
    file: &SourceFile,
    options: &BuildOptions,
) -> Result<FileMeta> {
    let mut extra = handler.meta(file)?;
    let filename = handler.resolve_filename(file);
    let target = resolve_output_path(&file.relative_dir, &filename, options.pretty);

    extra.remove(PATH_KEY);
    extra.remove(TARGET_PATH_KEY);
    let last_modified = extra
        .remove(LAST_MODIFIED_KEY)
        .unwrap_or_else(|| Value::from(file.modified.timestamp()));

    Ok(FileMeta {
        path: file.relative_path.clone(),
        target_path: target.path,
        last_modified,
        extra,
    })
}
