//! Table creation from the configured schema.
//!
//! Runs outside the load transaction; every statement is
//! `CREATE TABLE IF NOT EXISTS`, so repeated runs are harmless.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::schema::{FieldDescriptor, Schema, TableDescriptor};
use crate::store::quote_ident;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_all(&pool, &config.schema()).await?;
    pool.close().await;
    Ok(())
}

/// Create every table in dependency order.
pub async fn create_all(pool: &SqlitePool, schema: &Schema) -> Result<()> {
    for table in schema.sorted_tables()? {
        sqlx::query(&create_table_sql(table))
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {}", table.name))?;
    }
    Ok(())
}

/// `CREATE TABLE IF NOT EXISTS` statement for one table.
pub fn create_table_sql(table: &TableDescriptor) -> String {
    let mut lines: Vec<String> = table.fields.iter().map(column_sql).collect();

    let keys: Vec<String> = table
        .fields
        .iter()
        .filter(|f| f.primary_key)
        .map(|f| quote_ident(&f.name))
        .collect();
    if !keys.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    for field in &table.fields {
        if let Some((target, column)) = field.reference() {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                quote_ident(&field.name),
                quote_ident(target),
                quote_ident(column)
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(&table.name),
        lines.join(",\n    ")
    )
}

fn column_sql(field: &FieldDescriptor) -> String {
    let mut sql = format!("{} {}", quote_ident(&field.name), field.kind.sql_type());
    if !field.is_nullable() {
        sql.push_str(" NOT NULL");
    }
    if field.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_literal(default));
    }
    sql
}

fn default_literal(value: &toml::Value) -> String {
    match value {
        toml::Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
