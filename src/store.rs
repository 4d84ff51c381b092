//! Persistence boundary: SQL rendering and statement execution for records.

use sqlx::sqlite::SqliteArguments;
use sqlx::query::Query;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::models::{FieldValue, Record};

/// Quote an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT` statement for a record, with one placeholder per set field.
pub fn insert_sql(record: &Record) -> String {
    if record.values.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&record.table));
    }

    let columns: Vec<String> = record
        .values
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect();
    let placeholders = vec!["?"; record.values.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&record.table),
        columns.join(", "),
        placeholders
    )
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Bool(b) => query.bind(*b),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Real(f) => query.bind(*f),
        FieldValue::Text(s) | FieldValue::Json(s) => query.bind(s.clone()),
    }
}

/// Insert one record on the given connection (normally an open transaction).
pub async fn insert_record(
    conn: &mut SqliteConnection,
    record: &Record,
) -> Result<(), sqlx::Error> {
    let sql = insert_sql(record);
    let mut query = sqlx::query(&sql);
    for (_, value) in &record.values {
        query = bind_value(query, value);
    }
    query.execute(&mut *conn).await?;
    Ok(())
}

/// Number of rows currently in `table`.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    sqlx::query_scalar(&sql).fetch_one(pool).await
}
