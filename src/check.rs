//! Dry-run loader resolution.
//!
//! Shows, per table, whether an entity binding exists and which loader its
//! directory resolves to, without opening the database. Used by
//! `fileseed check` to verify a content tree before loading it.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::load::Seeder;
use crate::loaders::loader_for;

/// Resolution result for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatus {
    pub table: String,
    pub has_model: bool,
    /// Loader kind name, or `None` when no layout matches.
    pub loader: Option<&'static str>,
}

impl TableStatus {
    pub fn is_loadable(&self) -> bool {
        self.has_model && self.loader.is_some()
    }
}

/// Resolve every table of `seeder` in load order.
pub fn check_tables(seeder: &Seeder) -> Result<Vec<TableStatus>> {
    let tables = seeder.validate()?;

    Ok(tables
        .into_iter()
        .map(|table| TableStatus {
            table: table.name.clone(),
            has_model: seeder.models().model_for(&table.name).is_ok(),
            loader: loader_for(seeder.data_dir(), table).map(|l| l.kind().as_str()),
        })
        .collect())
}

pub fn run_check(config: &Config) -> Result<()> {
    let statuses = check_tables(&Seeder::from_config(config))?;

    println!("{:<20} {:<8} LOADER", "TABLE", "MODEL");
    for status in &statuses {
        println!(
            "{:<20} {:<8} {}",
            status.table,
            if status.has_model { "yes" } else { "MISSING" },
            status.loader.unwrap_or("NO LOADER")
        );
    }

    let broken = statuses.iter().filter(|s| !s.is_loadable()).count();
    if broken > 0 {
        bail!("{} table(s) cannot be loaded", broken);
    }
    println!("ok");
    Ok(())
}
