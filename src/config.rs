use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::schema::{Schema, TableDescriptor};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub data: DataConfig,
    /// Entity bindings, one per table to load.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Target schema.
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Root holding one subdirectory per table.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub table: String,
    /// Values for fields a source file leaves unset.
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,
}

impl Config {
    pub fn schema(&self) -> Schema {
        Schema::new(self.tables.clone())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let mut table_names = HashSet::new();
    for table in &config.tables {
        if !table_names.insert(table.name.as_str()) {
            bail!("tables: '{}' is declared more than once", table.name);
        }
        if table.fields.is_empty() {
            bail!("tables.{}: at least one field is required", table.name);
        }

        let mut field_names = HashSet::new();
        for field in &table.fields {
            if !field_names.insert(field.name.as_str()) {
                bail!("tables.{}: field '{}' is declared more than once", table.name, field.name);
            }
        }
    }

    let schema = config.schema();
    for table in schema.tables() {
        for field in &table.fields {
            let Some(target) = &field.references else {
                continue;
            };
            let Some((target_table, target_field)) = field.reference() else {
                bail!(
                    "tables.{}.{}: references must be 'table.column', got '{}'",
                    table.name,
                    field.name,
                    target
                );
            };
            let Some(referenced) = schema.table(target_table) else {
                bail!(
                    "tables.{}.{}: references unknown table '{}'",
                    table.name,
                    field.name,
                    target_table
                );
            };
            if !referenced.has_field(target_field) {
                bail!(
                    "tables.{}.{}: references unknown field '{}'",
                    table.name,
                    field.name,
                    target
                );
            }
        }
    }

    schema
        .sorted_tables()
        .with_context(|| "tables: foreign keys must not form a cycle")?;

    let mut model_tables = HashSet::new();
    for model in &config.models {
        if !model_tables.insert(model.table.as_str()) {
            bail!("models: '{}' is bound more than once", model.table);
        }
        let Some(table) = schema.table(&model.table) else {
            bail!("models.{}: no such table is declared", model.table);
        };
        for field in model.defaults.keys() {
            if !table.has_field(field) {
                bail!(
                    "models.{}: default for undeclared field '{}'",
                    model.table,
                    field
                );
            }
        }
    }

    Ok(())
}
