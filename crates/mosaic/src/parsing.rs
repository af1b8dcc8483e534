use crate::error::{MosaicError, Result};
use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};
use std::path::Path;

pub type Frontmatter = Map<String, Value>;

pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let parser = Parser::new_ext(content, options);
    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Splits a document into its front matter and body.
///
/// `+++` fences hold TOML, `---` fences hold YAML. A document without a
/// leading fence has empty front matter.
pub fn extract_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let content = content.replace("\r\n", "\n");
    let content = content.trim_start();

    if content.starts_with("+++") {
        parse_toml_frontmatter(content, path)
    } else if content.starts_with("---") {
        parse_yaml_frontmatter(content, path)
    } else {
        Ok((Frontmatter::new(), content.to_string()))
    }
}

fn parse_toml_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let (raw, body) = split_fenced(content, "+++", path)?;

    let table: toml::Table = toml::from_str(raw).map_err(|error| MosaicError::TomlParse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let frontmatter = table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect();

    Ok((frontmatter, body))
}

fn parse_yaml_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let (raw, body) = split_fenced(content, "---", path)?;

    if raw.trim().is_empty() {
        return Ok((Frontmatter::new(), body));
    }

    let frontmatter: Frontmatter =
        serde_yml::from_str(raw).map_err(|error| MosaicError::YamlParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;

    Ok((frontmatter, body))
}

fn split_fenced<'a>(content: &'a str, delimiter: &str, path: &Path) -> Result<(&'a str, String)> {
    let rest = &content[delimiter.len()..];

    let end_index =
        find_closing_delimiter(rest, delimiter).ok_or_else(|| MosaicError::InvalidFrontmatter {
            path: path.to_path_buf(),
        })?;

    let raw = &rest[..end_index];
    let body = &rest[end_index + delimiter.len()..];

    Ok((raw, body.trim().to_string()))
}

fn find_closing_delimiter(content: &str, delimiter: &str) -> Option<usize> {
    let mut position = 0;

    for (index, line) in content.split('\n').enumerate() {
        // The opening fence's own line remainder is not a candidate.
        if index > 0 && line.trim() == delimiter {
            return Some(position);
        }
        position += line.len() + 1;
    }

    None
}

/// Converts TOML into JSON, rendering datetimes as their TOML string form.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(string) => Value::String(string),
        toml::Value::Integer(integer) => Value::from(integer),
        toml::Value::Float(float) => Value::from(float),
        toml::Value::Boolean(boolean) => Value::Bool(boolean),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(array) => Value::Array(array.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
