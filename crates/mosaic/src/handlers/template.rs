use super::{Handler, RenderContext};
use crate::error::Result;
use crate::render::{Renderer, TEMPLATE_EXTENSION};
use crate::types::{ProcessedFile, SourceFile};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Renders `*.tera` files.
///
/// `about.tera` becomes `about.html`; a name that still carries an extension
/// after dropping `.tera` keeps it, so `feed.xml.tera` becomes `feed.xml`.
pub struct TemplateHandler {
    renderer: Arc<dyn Renderer>,
}

impl TemplateHandler {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    fn template_stem<'a>(&self, file: &'a SourceFile) -> Option<&'a str> {
        file.filename
            .strip_suffix(TEMPLATE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
    }
}

impl Handler for TemplateHandler {
    fn name(&self) -> &str {
        "template"
    }

    fn can_handle(&self, file: &SourceFile) -> bool {
        self.template_stem(file).is_some()
    }

    fn resolve_filename(&self, file: &SourceFile) -> String {
        let stem = self.template_stem(file).unwrap_or(&file.filename);

        if Path::new(stem).extension().is_some() {
            stem.to_string()
        } else {
            format!("{}.html", stem)
        }
    }

    fn handle(&self, file: &SourceFile, context: &RenderContext<'_>) -> Result<ProcessedFile> {
        let data = context.page_data(file)?;
        let rendered = self.renderer.render(&file.path, &Value::Object(data))?;

        Ok(ProcessedFile::new(
            self.resolve_filename(file),
            file.relative_dir.clone(),
            rendered,
        ))
    }
}
