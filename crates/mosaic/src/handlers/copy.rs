use super::{Handler, RenderContext};
use crate::error::{IoContext, Result};
use crate::types::{ProcessedFile, SourceFile};
use std::fs;

/// Copies any file through unchanged. Register it last.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyHandler;

impl Handler for CopyHandler {
    fn name(&self) -> &str {
        "copy"
    }

    fn can_handle(&self, _file: &SourceFile) -> bool {
        true
    }

    fn resolve_filename(&self, file: &SourceFile) -> String {
        file.filename.clone()
    }

    fn handle(&self, file: &SourceFile, _context: &RenderContext<'_>) -> Result<ProcessedFile> {
        let contents = fs::read(&file.path).io_context("reading", &file.path)?;
        Ok(ProcessedFile::new(
            file.filename.clone(),
            file.relative_dir.clone(),
            contents,
        ))
    }
}
