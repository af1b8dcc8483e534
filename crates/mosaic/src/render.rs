use crate::error::{MosaicError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use walkdir::WalkDir;

pub const TEMPLATE_EXTENSION: &str = "tera";
const TEMPLATE_SUFFIX: &str = ".tera";

/// Renders a template file with a data context.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &Path, data: &Value) -> Result<String>;
}

/// Tera-backed renderer.
///
/// Every `*.tera` file under the root is registered by its `/`-separated path
/// relative to the root, partials and layouts included, so templates can
/// `extends` and `include` each other by that name.
pub struct TeraRenderer {
    tera: Tera,
    root: PathBuf,
}

impl TeraRenderer {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut templates = Vec::new();

        if root.is_dir() {
            for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|error| MosaicError::WalkDir {
                    path: root.clone(),
                    message: error.to_string(),
                })?;

                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|extension| extension.to_str())
                        != Some(TEMPLATE_EXTENSION)
                {
                    continue;
                }

                let name = template_name(&root, path)?;
                templates.push((path.to_path_buf(), Some(name)));
            }
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![TEMPLATE_SUFFIX]);
        tera.set_escape_fn(escape_markup);
        tera.add_template_files(templates)?;

        Ok(Self { tera, root })
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &Path, data: &Value) -> Result<String> {
        let name = template_name(&self.root, template)?;
        let context = Context::from_serialize(data)?;
        Ok(self.tera.render(&name, &context)?)
    }
}

/// Escapes interpolated values. Unlike Tera's default, `/` is left alone so
/// URLs stay readable.
fn escape_markup(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn template_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| MosaicError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}
