//! Row counts per configured table.
//!
//! Used by `fileseed stats` to confirm what the last load committed.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::schema::Schema;
use crate::store;

/// Row count of every table, in load order.
pub async fn table_counts(pool: &SqlitePool, schema: &Schema) -> Result<Vec<(String, i64)>> {
    let mut counts = Vec::new();
    for table in schema.sorted_tables()? {
        let rows = store::count_rows(pool, &table.name)
            .await
            .with_context(|| format!("Failed to count rows in {}", table.name))?;
        counts.push((table.name.clone(), rows));
    }
    Ok(counts)
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let counts = table_counts(&pool, &config.schema()).await;
    pool.close().await;
    let counts = counts?;

    println!("fileseed: database stats");
    println!("========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size(config)));
    println!();
    println!("  {:<20} {:>10}", "TABLE", "ROWS");
    for (table, rows) in &counts {
        println!("  {:<20} {:>10}", table, rows);
    }
    println!();
    println!("  Total:       {}", counts.iter().map(|(_, n)| n).sum::<i64>());

    Ok(())
}

fn db_size(config: &Config) -> u64 {
    std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0)
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
