//! Output path resolution.
//!
//! With pretty paths enabled, an HTML page `about.html` is written to
//! `about/index.html` so it can be linked as `/about/`. Every other file keeps
//! its literal name. The metadata pass and the write pass both go through
//! [`resolve_output_path`], so the recorded `target-path` of a file is always
//! the path it is written to.

use std::path::Path;

const INDEX_FILE: &str = "index.html";

/// Relative output location of a file, `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    pub directory: String,
    pub path: String,
}

pub fn resolve_output_path(relative_dir: &str, filename: &str, pretty: bool) -> OutputPath {
    if pretty && let Some(stem) = pretty_page_stem(filename) {
        let directory = join(relative_dir, stem);
        let path = join(&directory, INDEX_FILE);
        return OutputPath { directory, path };
    }

    OutputPath {
        directory: relative_dir.to_string(),
        path: join(relative_dir, filename),
    }
}

/// The stem of `filename` if it should be rewritten to `<stem>/index.html`.
fn pretty_page_stem(filename: &str) -> Option<&str> {
    if filename == INDEX_FILE {
        return None;
    }

    let path = Path::new(filename);
    if path.extension().and_then(|extension| extension.to_str()) != Some("html") {
        return None;
    }

    path.file_stem().and_then(|stem| stem.to_str())
}

/// Joins two relative path fragments, skipping an empty leading directory.
fn join(directory: &str, name: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", directory, name)
    }
}
