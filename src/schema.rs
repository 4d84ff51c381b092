//! Table and field descriptors.
//!
//! These types describe the target relational schema: which tables exist,
//! which fields each declares, and which other tables they reference. They
//! are read-only to the loader; the configuration file is their source.

use serde::Deserialize;

use crate::error::{LoadError, LoadResult};

/// Storage type of a field.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Real,
    Boolean,
    /// Structured value stored as JSON text.
    Json,
}

impl FieldKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Json => "TEXT",
            FieldKind::Integer => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::Boolean => "BOOLEAN",
        }
    }
}

/// A declared field of a table.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: FieldKind,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    /// Column default applied by the database when a record leaves the field unset.
    #[serde(default)]
    pub default: Option<toml::Value>,
    /// Foreign key target in `table.column` form.
    #[serde(default)]
    pub references: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl FieldDescriptor {
    /// A nullable text field with no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            nullable: true,
            primary_key: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.references = Some(target.into());
        self
    }

    /// Whether the column accepts NULL. Primary keys never do.
    pub fn is_nullable(&self) -> bool {
        self.nullable && !self.primary_key
    }

    /// Split `references` into `(table, column)`.
    pub fn reference(&self) -> Option<(&str, &str)> {
        self.references.as_deref().and_then(|r| r.split_once('.'))
    }
}

/// A table: its name and ordered fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Names of other tables this one references, in field order, deduplicated.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for field in &self.fields {
            if let Some((table, _)) = field.reference() {
                if table != self.name && !deps.contains(&table) {
                    deps.push(table);
                }
            }
        }
        deps
    }
}

/// The full set of tables a load targets.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<TableDescriptor>,
}

impl Schema {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables in dependency order: every referenced table comes before the
    /// tables that reference it. Independent tables keep declaration order.
    ///
    /// References to tables outside the schema are ignored here; config
    /// validation rejects them earlier.
    pub fn sorted_tables(&self) -> LoadResult<Vec<&TableDescriptor>> {
        let mut sorted: Vec<&TableDescriptor> = Vec::with_capacity(self.tables.len());
        let mut remaining: Vec<&TableDescriptor> = self.tables.iter().collect();

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|table| {
                table.dependencies().iter().all(|dep| {
                    self.table(dep).is_none() || sorted.iter().any(|done| done.name == *dep)
                })
            });

            match ready {
                Some(idx) => sorted.push(remaining.remove(idx)),
                None => {
                    let names: Vec<&str> = remaining.iter().map(|t| t.name.as_str()).collect();
                    return Err(LoadError::DependencyCycle(names.join(", ")));
                }
            }
        }

        Ok(sorted)
    }
}
