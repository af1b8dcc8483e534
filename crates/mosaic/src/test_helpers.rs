use crate::error::{MosaicError, Result};
use crate::handlers::{Handler, RenderContext};
use crate::types::{ProcessedFile, SourceFile};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub(crate) fn write_source(root: &Path, relative: &str, contents: &str) -> SourceFile {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    SourceFile::new(root, &path).unwrap()
}

/// Handler that claims files ending in `suffix`, swaps the suffix for
/// `output_suffix`, and writes a listing of the whole site metadata so tests
/// can see exactly what was visible at render time.
pub(crate) struct StubHandler {
    pub name: &'static str,
    pub suffix: &'static str,
    pub output_suffix: &'static str,
    pub meta: Map<String, Value>,
    pub fail_on: Option<&'static str>,
}

impl StubHandler {
    pub(crate) fn new(
        name: &'static str,
        suffix: &'static str,
        output_suffix: &'static str,
    ) -> Self {
        Self {
            name,
            suffix,
            output_suffix,
            meta: Map::new(),
            fail_on: None,
        }
    }

    pub(crate) fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta.insert(key.to_string(), value);
        self
    }

    pub(crate) fn failing_on(mut self, filename: &'static str) -> Self {
        self.fail_on = Some(filename);
        self
    }
}

impl Handler for StubHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn can_handle(&self, file: &SourceFile) -> bool {
        file.strip_suffix(self.suffix).is_some()
    }

    fn resolve_filename(&self, file: &SourceFile) -> String {
        let stem = file.strip_suffix(self.suffix).unwrap_or(&file.filename);
        format!("{}{}", stem, self.output_suffix)
    }

    fn meta(&self, _file: &SourceFile) -> Result<Map<String, Value>> {
        Ok(self.meta.clone())
    }

    fn handle(&self, file: &SourceFile, context: &RenderContext<'_>) -> Result<ProcessedFile> {
        if self.fail_on == Some(file.filename.as_str()) {
            return Err(MosaicError::Template(tera::Error::msg(format!(
                "cannot render {}",
                file.relative_path
            ))));
        }

        let mut contents = format!("{} rendered {}\n", self.name, file.relative_path);
        for (path, meta) in context.site.meta.iter() {
            contents.push_str(&format!("{} -> {}\n", path, meta.target_path));
        }

        Ok(ProcessedFile::new(
            self.resolve_filename(file),
            file.relative_dir.clone(),
            contents,
        ))
    }
}
