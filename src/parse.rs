//! Record parser: one file in, raw field mappings out.
//!
//! YAML files decode to a single mapping (one record per file) or, for the
//! aggregate `_all.yml`, to a sequence of mappings. Markdown files carry an
//! optional YAML frontmatter block followed by a free-text body.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{LoadError, LoadResult};

/// Raw field name → value mapping as decoded from a source file.
pub type RawMapping = Mapping;

/// Decode a file holding exactly one mapping.
pub fn parse_yaml_mapping(path: &Path) -> LoadResult<RawMapping> {
    match read_yaml(path)? {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(LoadError::invalid_format(
            path,
            format!("expected a mapping, found {}", shape(&other)),
        )),
    }
}

/// Decode a file holding a sequence whose every element is a mapping.
pub fn parse_yaml_sequence(path: &Path) -> LoadResult<Vec<RawMapping>> {
    let values = match read_yaml(path)? {
        Value::Sequence(values) => values,
        other => {
            return Err(LoadError::invalid_format(
                path,
                format!("expected a sequence of mappings, found {}", shape(&other)),
            ))
        }
    };

    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match value {
            Value::Mapping(mapping) => Ok(mapping),
            other => Err(LoadError::invalid_format(
                path,
                format!("item {} is {}, expected a mapping", idx, shape(&other)),
            )),
        })
        .collect()
}

/// Decode a Markdown file into its frontmatter mapping and body text.
pub fn parse_frontmatter_file(path: &Path) -> LoadResult<(RawMapping, String)> {
    let text = read_text(path)?;
    let (frontmatter, body) = split_frontmatter(&text);

    let mapping = match frontmatter {
        None => Mapping::new(),
        Some(block) => match decode(path, block)? {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(LoadError::invalid_format(
                    path,
                    format!("frontmatter must be a mapping, found {}", shape(&other)),
                ))
            }
        },
    };

    Ok((mapping, body.to_string()))
}

/// Split Markdown text into `(frontmatter, body)`.
///
/// The text is trimmed first. A frontmatter block opens with a line of three
/// or more dashes and closes at the next such line. Without a closed block
/// the whole text is the body. The body is trimmed.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let text = text.trim();

    let Some(first_newline) = text.find('\n') else {
        return (None, text);
    };
    if !is_boundary(&text[..first_newline]) {
        return (None, text);
    }

    let rest = &text[first_newline + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if is_boundary(line) {
            let frontmatter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(frontmatter), body.trim());
        }
        offset += line.len();
    }

    (None, text)
}

fn is_boundary(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

fn read_text(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            LoadError::invalid_format(path, "not valid UTF-8")
        } else {
            LoadError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn read_yaml(path: &Path) -> LoadResult<Value> {
    let text = read_text(path)?;
    decode(path, &text)
}

fn decode(path: &Path, text: &str) -> LoadResult<Value> {
    serde_yaml::from_str(text).map_err(|e| LoadError::invalid_format(path, e.to_string()))
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
