//! Error taxonomy for a load.
//!
//! Every variant is fatal: the orchestrator never retries or skips, it rolls
//! the whole load back and hands the error to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Error returned by any stage of a load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The configured data root is missing or is not a directory.
    #[error("{} is not a directory", .0.display())]
    InvalidDataDirectory(PathBuf),

    /// No table/entity bindings were registered.
    #[error("no models found")]
    NoModelsConfigured,

    /// A table directory matches none of the loader layouts.
    #[error("no loader found for {0}")]
    NoLoaderFound(String),

    /// A source file (or table directory) could not be read.
    #[error("could not open {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decoded content has the wrong shape or does not decode at all.
    #[error("{} contains invalid data: {reason}", path.display())]
    InvalidFormat { path: PathBuf, reason: String },

    /// A table has no registered entity binding.
    #[error("{0} model not available")]
    UnknownModel(String),

    /// The database rejected a record (unique, foreign key, not-null, check).
    #[error("constraint violation while loading {table}: {source}")]
    ConstraintViolation {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// Two or more tables reference each other, so no load order exists.
    #[error("dependency cycle between tables: {0}")]
    DependencyCycle(String),

    /// Rolling back after `cause` failed as well.
    #[error("{cause} (rollback failed: {source})")]
    RollbackFailed {
        cause: Box<LoadError>,
        #[source]
        source: sqlx::Error,
    },

    /// Any other database failure (connection, commit).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoadError {
    /// Classify a failed insert for `table`.
    pub fn from_insert(table: &str, err: sqlx::Error) -> Self {
        if is_constraint_violation(&err) {
            LoadError::ConstraintViolation {
                table: table.to_string(),
                source: err,
            }
        } else {
            LoadError::Database(err)
        }
    }

    /// Attach the outcome of the rollback that followed this error.
    pub fn after_rollback(self, rollback: Result<(), sqlx::Error>) -> Self {
        match rollback {
            Ok(()) => self,
            Err(source) => LoadError::RollbackFailed {
                cause: Box::new(self),
                source,
            },
        }
    }

    pub(crate) fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => !matches!(db_err.kind(), sqlx::error::ErrorKind::Other),
        _ => false,
    }
}
