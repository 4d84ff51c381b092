//! Load orchestration.
//!
//! Visits tables in dependency order inside one transaction: for each table,
//! find its entity binding, resolve its loader, stage every extracted record
//! and then flush them. Any failure rolls back the whole load; success
//! commits once for the entire data directory.
//!
//! ```text
//! Validating ──▶ Extracting ──▶ Committed
//!     │              │
//!     ▼              ▼
//!   Failed       RolledBack
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::error::{LoadError, LoadResult};
use crate::loaders::{loader_for, LoaderKind};
use crate::migrate;
use crate::models::{EntityFactory, ModelRegistry, Record};
use crate::progress::{LoadPhase, LoadProgressEvent, LoadProgressReporter, ProgressMode};
use crate::schema::{Schema, TableDescriptor};
use crate::store;

/// Outcome of one table within a committed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub loader: LoaderKind,
    pub records: usize,
}

/// Outcome of a committed load, tables in visiting order.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tables: Vec<TableReport>,
}

impl LoadReport {
    pub fn total_records(&self) -> usize {
        self.tables.iter().map(|t| t.records).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// Loads a data directory into the tables of a schema.
pub struct Seeder {
    data_dir: PathBuf,
    schema: Schema,
    models: ModelRegistry,
}

impl Seeder {
    pub fn new(data_dir: impl Into<PathBuf>, schema: Schema, models: ModelRegistry) -> Self {
        Self {
            data_dir: data_dir.into(),
            schema,
            models,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.data.dir,
            config.schema(),
            ModelRegistry::from_config(config),
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Register an extra entity binding before loading.
    pub fn register(&mut self, model: Box<dyn EntityFactory>) {
        self.models.register(model);
    }

    /// Pre-flight checks. Nothing is read from the table directories.
    pub fn validate(&self) -> LoadResult<Vec<&TableDescriptor>> {
        if self.models.is_empty() {
            return Err(LoadError::NoModelsConfigured);
        }
        if !self.data_dir.is_dir() {
            return Err(LoadError::InvalidDataDirectory(self.data_dir.clone()));
        }
        self.schema.sorted_tables()
    }

    /// Load every table in one transaction.
    pub async fn load_tables(
        &self,
        pool: &SqlitePool,
        progress: &dyn LoadProgressReporter,
    ) -> LoadResult<LoadReport> {
        progress.report(LoadProgressEvent::Phase {
            phase: LoadPhase::Validating,
        });
        let tables = match self.validate() {
            Ok(tables) => tables,
            Err(e) => {
                progress.report(LoadProgressEvent::Finished {
                    phase: LoadPhase::Failed,
                    records: 0,
                });
                return Err(e);
            }
        };

        let mut tx = pool.begin().await?;
        progress.report(LoadProgressEvent::Phase {
            phase: LoadPhase::Extracting,
        });
        let mut report = LoadReport::default();
        let total = tables.len() as u64;

        for (idx, table) in tables.into_iter().enumerate() {
            match self.load_table(&mut *tx, table, progress).await {
                Ok(table_report) => {
                    progress.report(LoadProgressEvent::Loaded {
                        table: table_report.table.clone(),
                        records: table_report.records as u64,
                        n: idx as u64 + 1,
                        total,
                    });
                    report.tables.push(table_report);
                }
                Err(e) => {
                    let e = e.after_rollback(tx.rollback().await);
                    progress.report(LoadProgressEvent::Finished {
                        phase: LoadPhase::RolledBack,
                        records: 0,
                    });
                    return Err(e);
                }
            }
        }

        if let Err(e) = tx.commit().await {
            progress.report(LoadProgressEvent::Finished {
                phase: LoadPhase::RolledBack,
                records: 0,
            });
            return Err(LoadError::Database(e));
        }

        progress.report(LoadProgressEvent::Finished {
            phase: LoadPhase::Committed,
            records: report.total_records() as u64,
        });
        Ok(report)
    }

    async fn load_table(
        &self,
        conn: &mut SqliteConnection,
        table: &TableDescriptor,
        progress: &dyn LoadProgressReporter,
    ) -> LoadResult<TableReport> {
        let model = self.models.model_for(&table.name)?;
        let loader = loader_for(&self.data_dir, table)
            .ok_or_else(|| LoadError::NoLoaderFound(table.name.clone()))?;

        progress.report(LoadProgressEvent::Resolved {
            table: table.name.clone(),
            loader: loader.kind(),
        });

        let staged: Vec<Record> = loader.extract(model).collect::<LoadResult<_>>()?;

        for record in &staged {
            store::insert_record(&mut *conn, record)
                .await
                .map_err(|e| LoadError::from_insert(&table.name, e))?;
        }

        Ok(TableReport {
            table: table.name.clone(),
            loader: loader.kind(),
            records: staged.len(),
        })
    }
}

/// CLI entry point: create tables, load, print a summary.
pub async fn run_load(config: &Config, progress: ProgressMode) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_all(&pool, &config.schema()).await?;

    let seeder = Seeder::from_config(config);
    let reporter = progress.reporter();
    let result = seeder.load_tables(&pool, reporter.as_ref()).await;
    pool.close().await;
    let report = result?;

    println!("load {}", config.data.dir.display());
    println!("  tables: {}", report.tables.len());
    for table in &report.tables {
        println!(
            "    {:<20} {:<20} {}",
            table.table,
            table.loader.as_str(),
            table.records
        );
    }
    println!("  records: {}", report.total_records());
    println!("ok");

    Ok(())
}
