//! Coercion: raw decoded mappings onto a table's declared fields.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{LoadError, LoadResult};
use crate::models::{EntityFactory, FieldValue, FieldValues, Record};
use crate::parse::RawMapping;
use crate::schema::TableDescriptor;

/// Build a record for `table` from one raw mapping.
///
/// Only declared fields are copied, in declaration order. Keys the table
/// does not declare are dropped; declared fields missing from the mapping
/// stay unset so the factory or the column default decides their value.
/// `source` names the file the mapping came from, for error reporting.
pub fn build_record(
    table: &TableDescriptor,
    factory: &dyn EntityFactory,
    raw: &RawMapping,
    source: &Path,
) -> LoadResult<Record> {
    let mut values: FieldValues = Vec::with_capacity(table.fields.len());

    for field in &table.fields {
        let Some(raw_value) = raw.get(field.name.as_str()) else {
            continue;
        };
        let value = FieldValue::from_yaml(raw_value).ok_or_else(|| {
            LoadError::invalid_format(
                source,
                format!("field '{}' cannot be stored as JSON", field.name),
            )
        })?;
        values.push((field.name.clone(), value));
    }

    factory.instantiate(values)
}

/// Bind `body` to the reserved content field, replacing any frontmatter value.
pub fn bind_content(raw: &mut RawMapping, field: &str, body: String) {
    raw.insert(Value::String(field.to_string()), Value::String(body));
}
