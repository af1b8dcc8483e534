use super::{Handler, RenderContext};
use crate::error::{IoContext, Result};
use crate::parsing::{Frontmatter, extract_frontmatter, render_markdown};
use crate::render::Renderer;
use crate::types::{ProcessedFile, SourceFile};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LAYOUT_KEY: &str = "extends";

/// Converts Markdown to HTML.
///
/// The front matter becomes the file's site metadata, so listings can show
/// titles and dates of other pages. When it names a layout under `extends`
/// (a template path relative to the source root), the layout is rendered
/// with the converted body as `content`.
pub struct MarkdownHandler {
    renderer: Arc<dyn Renderer>,
    root: PathBuf,
}

impl MarkdownHandler {
    pub fn new(renderer: Arc<dyn Renderer>, root: impl AsRef<Path>) -> Self {
        Self {
            renderer,
            root: root.as_ref().to_path_buf(),
        }
    }

    fn read(&self, file: &SourceFile) -> Result<(Frontmatter, String)> {
        let content = fs::read_to_string(&file.path).io_context("reading markdown", &file.path)?;
        extract_frontmatter(&content, &file.path)
    }
}

impl Handler for MarkdownHandler {
    fn name(&self) -> &str {
        "markdown"
    }

    fn can_handle(&self, file: &SourceFile) -> bool {
        matches!(file.extension.as_str(), "md" | "markdown")
    }

    fn resolve_filename(&self, file: &SourceFile) -> String {
        format!("{}.html", file.stem())
    }

    fn meta(&self, file: &SourceFile) -> Result<Frontmatter> {
        let (frontmatter, _) = self.read(file)?;
        Ok(frontmatter)
    }

    fn handle(&self, file: &SourceFile, context: &RenderContext<'_>) -> Result<ProcessedFile> {
        let (frontmatter, body) = self.read(file)?;
        let html = render_markdown(&body);

        let contents = match frontmatter.get(LAYOUT_KEY).and_then(Value::as_str) {
            Some(layout) => {
                let mut data = context.page_data(file)?;
                data.insert("content".to_string(), Value::String(html));
                self.renderer
                    .render(&self.root.join(layout), &Value::Object(data))?
            }
            None => html,
        };

        Ok(ProcessedFile::new(
            self.resolve_filename(file),
            file.relative_dir.clone(),
            contents,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MosaicError;
    use crate::handlers::{HandlerRegistry, SiteContext};
    use crate::meta::collect_site_meta;
    use crate::render::TeraRenderer;
    use crate::test_helpers::write_source;
    use crate::types::BuildOptions;
    use serde_json::Map;
    use tempfile::TempDir;

    fn handler_for(root: &Path) -> MarkdownHandler {
        MarkdownHandler::new(Arc::new(TeraRenderer::new(root).unwrap()), root)
    }

    fn render(root: &Path, files: &[SourceFile], target: &SourceFile) -> Result<String> {
        let registry = HandlerRegistry::new().with(handler_for(root));
        let options = BuildOptions::default();
        let meta = collect_site_meta(files, &registry, &options)?;
        let variables = Map::new();
        let context = RenderContext {
            variables: &variables,
            site: SiteContext {
                meta: &meta,
                options: &options,
            },
        };

        let processed = handler_for(root).handle(target, &context)?;
        Ok(String::from_utf8(processed.contents).unwrap())
    }

    #[test]
    fn test_resolve_filename_and_can_handle() {
        let dir = TempDir::new().unwrap();
        let handler = handler_for(dir.path());

        let post = write_source(dir.path(), "blog/hello.md", "");
        let long = write_source(dir.path(), "notes.markdown", "");
        let other = write_source(dir.path(), "notes.txt", "");

        assert!(handler.can_handle(&post));
        assert!(handler.can_handle(&long));
        assert!(!handler.can_handle(&other));
        assert_eq!(handler.resolve_filename(&post), "hello.html");
        assert_eq!(handler.resolve_filename(&long), "notes.html");
    }

    #[test]
    fn test_meta_is_frontmatter() {
        let dir = TempDir::new().unwrap();
        let file = write_source(
            dir.path(),
            "post.md",
            "+++\ntitle = \"Hello\"\nlast_modified = 42\n+++\n\nBody",
        );

        let meta = handler_for(dir.path()).meta(&file).unwrap();
        assert_eq!(meta["title"], "Hello");
        assert_eq!(meta["last_modified"], 42);
    }

    #[test]
    fn test_handle_without_layout_is_fragment() {
        let dir = TempDir::new().unwrap();
        let file = write_source(dir.path(), "post.md", "---\ntitle: Hi\n---\n# Heading");

        let output = render(dir.path(), &[file.clone()], &file).unwrap();
        assert_eq!(output.trim(), "<h1>Heading</h1>");
    }

    #[test]
    fn test_handle_with_layout() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "_layouts/post.tera",
            "<title>{{ page.title }}</title>{{ content | safe }}<nav>{{ site.meta[\"other.md\"].title }}</nav>",
        );
        let file = write_source(
            dir.path(),
            "post.md",
            "+++\ntitle = \"First\"\nextends = \"_layouts/post.tera\"\n+++\n\n*hi*",
        );
        let other = write_source(dir.path(), "other.md", "+++\ntitle = \"Second\"\n+++\n");

        let output = render(dir.path(), &[file.clone(), other], &file).unwrap();
        assert_eq!(output, "<title>First</title><p><em>hi</em></p>\n<nav>Second</nav>");
    }

    #[test]
    fn test_missing_layout_fails() {
        let dir = TempDir::new().unwrap();
        let file = write_source(
            dir.path(),
            "post.md",
            "+++\nextends = \"_layouts/missing.tera\"\n+++\nbody",
        );

        let result = render(dir.path(), &[file.clone()], &file);
        assert!(matches!(result, Err(MosaicError::Template(_))));
    }
}
