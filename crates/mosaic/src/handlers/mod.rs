//! Per-file-type content handlers and the ordered registry that picks one.
//!
//! Resolution is first-match-wins in registration order, so more specific
//! handlers must be registered before general ones. [`default_registry`] ends
//! with [`CopyHandler`], which claims every file, so with the default set no
//! file goes unhandled.

pub mod copy;
pub mod markdown;
pub mod sass;
pub mod template;

pub use copy::CopyHandler;
pub use markdown::MarkdownHandler;
pub use sass::SassHandler;
pub use template::TemplateHandler;

use crate::error::Result;
use crate::render::{Renderer, TeraRenderer};
use crate::types::{BuildOptions, ProcessedFile, SiteMeta, SourceFile};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn can_handle(&self, file: &SourceFile) -> bool;

    /// Output filename for `file`. Called in both build passes, so it must
    /// depend only on the file's name.
    fn resolve_filename(&self, file: &SourceFile) -> String;

    /// Extra fields merged into the file's site metadata record.
    fn meta(&self, _file: &SourceFile) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn handle(&self, file: &SourceFile, context: &RenderContext<'_>) -> Result<ProcessedFile>;
}

/// The `site` object every file sees while it is rendered.
#[derive(Debug, Serialize)]
pub struct SiteContext<'a> {
    pub meta: &'a SiteMeta,
    pub options: &'a BuildOptions,
}

pub struct RenderContext<'a> {
    pub variables: &'a Map<String, Value>,
    pub site: SiteContext<'a>,
}

impl RenderContext<'_> {
    /// Build variables with `site` injected on top.
    pub fn data(&self) -> Result<Map<String, Value>> {
        let mut data = self.variables.clone();
        data.insert("site".to_string(), serde_json::to_value(&self.site)?);
        Ok(data)
    }

    /// [`Self::data`] plus the file's own metadata record as `page`.
    pub fn page_data(&self, file: &SourceFile) -> Result<Map<String, Value>> {
        let mut data = self.data()?;
        if let Some(meta) = self.site.meta.get(&file.relative_path) {
            data.insert("page".to_string(), serde_json::to_value(meta)?);
        }
        Ok(data)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.register(handler);
        self
    }

    /// The first registered handler that claims `file`.
    pub fn resolve(&self, file: &SourceFile) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(file))
            .map(|handler| handler.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Markdown, Sass, Tera templates, then copy-through for everything else.
pub fn default_registry(source: &Path) -> Result<HandlerRegistry> {
    let renderer: Arc<dyn Renderer> = Arc::new(TeraRenderer::new(source)?);

    Ok(HandlerRegistry::new()
        .with(MarkdownHandler::new(renderer.clone(), source))
        .with(SassHandler::new(source))
        .with(TemplateHandler::new(renderer))
        .with(CopyHandler))
}
