use super::{Handler, RenderContext};
use crate::error::{MosaicError, Result};
use crate::types::{ProcessedFile, SourceFile};
use std::path::{Path, PathBuf};

/// Compiles `*.scss` and `*.sass` stylesheets to CSS.
///
/// `_`-prefixed partials never reach this handler but stay importable, and
/// the source root is on the load path.
pub struct SassHandler {
    root: PathBuf,
}

impl SassHandler {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Handler for SassHandler {
    fn name(&self) -> &str {
        "sass"
    }

    fn can_handle(&self, file: &SourceFile) -> bool {
        matches!(file.extension.as_str(), "scss" | "sass")
    }

    fn resolve_filename(&self, file: &SourceFile) -> String {
        format!("{}.css", file.stem())
    }

    fn handle(&self, file: &SourceFile, _context: &RenderContext<'_>) -> Result<ProcessedFile> {
        let options = grass::Options::default().load_path(&self.root);
        let css = grass::from_path(&file.path, &options).map_err(|error| MosaicError::Sass {
            path: file.path.clone(),
            message: error.to_string(),
        })?;

        Ok(ProcessedFile::new(
            self.resolve_filename(file),
            file.relative_dir.clone(),
            css,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::SiteContext;
    use crate::test_helpers::write_source;
    use crate::types::{BuildOptions, SiteMeta};
    use serde_json::Map;
    use tempfile::TempDir;

    fn compile(root: &Path, file: &SourceFile) -> Result<ProcessedFile> {
        let meta = SiteMeta::new();
        let options = BuildOptions::default();
        let variables = Map::new();
        let context = RenderContext {
            variables: &variables,
            site: SiteContext {
                meta: &meta,
                options: &options,
            },
        };
        SassHandler::new(root).handle(file, &context)
    }

    #[test]
    fn test_compiles_with_partial() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "css/_colors.scss", "$accent: #ff0000;");
        let file = write_source(
            dir.path(),
            "css/main.scss",
            "@import \"colors\";\na { color: $accent; }",
        );

        let processed = compile(dir.path(), &file).unwrap();
        let css = String::from_utf8(processed.contents).unwrap();

        assert_eq!(processed.filename, "main.css");
        assert_eq!(processed.relative_dir, "css");
        assert!(css.contains("color: #ff0000"));
    }

    #[test]
    fn test_load_path_is_source_root() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "shared/_base.scss", "body { margin: 0; }");
        let file = write_source(dir.path(), "themes/dark/site.scss", "@import \"shared/base\";");

        let css = String::from_utf8(compile(dir.path(), &file).unwrap().contents).unwrap();
        assert!(css.contains("margin: 0"));
    }

    #[test]
    fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        let file = write_source(dir.path(), "broken.scss", "a { color: ");

        let result = compile(dir.path(), &file);
        assert!(matches!(result, Err(MosaicError::Sass { .. })));
    }

    #[test]
    fn test_can_handle() {
        let dir = TempDir::new().unwrap();
        let handler = SassHandler::new(dir.path());

        assert!(handler.can_handle(&write_source(dir.path(), "a.scss", "")));
        assert!(handler.can_handle(&write_source(dir.path(), "b.sass", "")));
        assert!(!handler.can_handle(&write_source(dir.path(), "c.css", "")));
    }
}
