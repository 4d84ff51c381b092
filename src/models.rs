//! Entity bindings and the records they construct.
//!
//! A [`Record`] is the transient value handed to the persistence layer: a
//! table name plus the fields the source actually set. Fields left unset are
//! absent, so column defaults apply when the row is inserted.
//!
//! An [`EntityFactory`] turns coerced field values into a record for one
//! table. [`Model`] is the factory built from configuration; custom factories
//! can be registered on a [`ModelRegistry`] before the load runs.

use std::collections::BTreeMap;

use crate::config::{Config, ModelConfig};
use crate::error::{LoadError, LoadResult};

/// A coerced value ready to be bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// Structured data (sequence or mapping) encoded as JSON text.
    Json(String),
}

impl FieldValue {
    /// Convert a decoded YAML value.
    ///
    /// Scalars map one to one; sequences and mappings become JSON text.
    /// Returns `None` for structures JSON cannot express (e.g. non-scalar keys).
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        use serde_yaml::Value;

        Some(match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Real(n.as_f64()?),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Sequence(_) | Value::Mapping(_) => {
                FieldValue::Json(serde_json::to_string(value).ok()?)
            }
            Value::Tagged(tagged) => return Self::from_yaml(&tagged.value),
        })
    }

    /// Convert a TOML value from the configuration file.
    pub fn from_toml(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => FieldValue::Text(s.clone()),
            toml::Value::Integer(i) => FieldValue::Integer(*i),
            toml::Value::Float(f) => FieldValue::Real(*f),
            toml::Value::Boolean(b) => FieldValue::Bool(*b),
            toml::Value::Datetime(dt) => FieldValue::Text(dt.to_string()),
            toml::Value::Array(_) | toml::Value::Table(_) => {
                FieldValue::Json(serde_json::to_string(value).unwrap_or_default())
            }
        }
    }
}

/// Field values selected for one record, in table field order.
pub type FieldValues = Vec<(String, FieldValue)>;

/// A constructed record for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub table: String,
    pub values: FieldValues,
}

impl Record {
    pub fn new(table: impl Into<String>, values: FieldValues) -> Self {
        Self {
            table: table.into(),
            values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Builds records for a single table.
///
/// # Example
///
/// ```rust
/// use fileseed::models::{EntityFactory, FieldValue, FieldValues, Record};
/// use fileseed::error::LoadResult;
///
/// struct Drafts;
///
/// impl EntityFactory for Drafts {
///     fn table_name(&self) -> &str { "drafts" }
///
///     fn instantiate(&self, mut values: FieldValues) -> LoadResult<Record> {
///         values.push(("published".to_string(), FieldValue::Bool(false)));
///         Ok(Record::new("drafts", values))
///     }
/// }
/// ```
pub trait EntityFactory: Send + Sync {
    /// Table this factory is bound to.
    fn table_name(&self) -> &str;

    /// Construct a record from values already filtered to declared fields.
    fn instantiate(&self, values: FieldValues) -> LoadResult<Record> {
        Ok(Record::new(self.table_name(), values))
    }
}

/// Configured entity binding with optional per-field defaults.
#[derive(Debug, Clone)]
pub struct Model {
    table: String,
    defaults: BTreeMap<String, FieldValue>,
}

impl Model {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.defaults.insert(field.into(), value);
        self
    }

    fn from_config(cfg: &ModelConfig) -> Self {
        let mut model = Self::new(&cfg.table);
        for (field, value) in &cfg.defaults {
            model = model.with_default(field, FieldValue::from_toml(value));
        }
        model
    }
}

impl EntityFactory for Model {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn instantiate(&self, mut values: FieldValues) -> LoadResult<Record> {
        for (field, default) in &self.defaults {
            if !values.iter().any(|(name, _)| name == field) {
                values.push((field.clone(), default.clone()));
            }
        }
        Ok(Record::new(&self.table, values))
    }
}

/// Ordered set of entity bindings, looked up by table name.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<Box<dyn EntityFactory>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Registry holding one [`Model`] per `[[models]]` entry.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for cfg in &config.models {
            registry.register(Box::new(Model::from_config(cfg)));
        }
        registry
    }

    /// Register a binding. Lookups return the first binding registered for a table.
    pub fn register(&mut self, model: Box<dyn EntityFactory>) {
        self.models.push(model);
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model_for(&self, table: &str) -> LoadResult<&dyn EntityFactory> {
        self.models
            .iter()
            .find(|m| m.table_name() == table)
            .map(|m| m.as_ref())
            .ok_or_else(|| LoadError::UnknownModel(table.to_string()))
    }
}
