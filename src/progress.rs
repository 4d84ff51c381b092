//! Load progress reporting.
//!
//! Reports which loader each table resolved to, how many records it
//! produced, and how the load ended. Progress is emitted on **stderr** so
//! stdout remains parseable for scripts.

use std::io::Write;

use crate::loaders::LoaderKind;

/// Phase of a load. The last three are terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadPhase {
    /// Pre-flight checks: bindings registered, data root present, order computable.
    Validating,
    /// Tables are being read and their records inserted inside the transaction.
    Extracting,
    /// The transaction committed every table.
    Committed,
    /// A pre-flight check failed; nothing was written.
    Failed,
    /// A table failed; the transaction was rolled back.
    RolledBack,
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::Validating => "validating",
            LoadPhase::Extracting => "extracting",
            LoadPhase::Committed => "committed",
            LoadPhase::Failed => "failed",
            LoadPhase::RolledBack => "rolled_back",
        }
    }
}

/// A single progress event for a load.
#[derive(Clone, Debug)]
pub enum LoadProgressEvent {
    /// The load entered a non-terminal phase.
    Phase { phase: LoadPhase },
    /// A loader was chosen for `table`.
    Resolved { table: String, loader: LoaderKind },
    /// `table` (the n-th of `total`) was flushed with `records` rows.
    Loaded {
        table: String,
        records: u64,
        n: u64,
        total: u64,
    },
    /// The load reached a terminal phase.
    Finished { phase: LoadPhase, records: u64 },
}

/// Reports load progress. Implementations write to stderr (human or JSON).
pub trait LoadProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the load orchestrator.
    fn report(&self, event: LoadProgressEvent);
}

/// Human-friendly progress on stderr: "load books  3 / 4 tables  1,234 records".
pub struct StderrProgress;

impl LoadProgressReporter for StderrProgress {
    fn report(&self, event: LoadProgressEvent) {
        let line = match &event {
            LoadProgressEvent::Phase { phase } => format!("load {}\n", phase.as_str()),
            LoadProgressEvent::Resolved { table, loader } => {
                format!("load {}  using {}\n", table, loader)
            }
            LoadProgressEvent::Loaded {
                table,
                records,
                n,
                total,
            } => format!(
                "load {}  {} / {} tables  {} records\n",
                table,
                n,
                total,
                format_number(*records)
            ),
            LoadProgressEvent::Finished { phase, records } => format!(
                "load {}  {} records\n",
                phase.as_str(),
                format_number(*records)
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl LoadProgressReporter for JsonProgress {
    fn report(&self, event: LoadProgressEvent) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

fn event_json(event: &LoadProgressEvent) -> serde_json::Value {
    match event {
        LoadProgressEvent::Phase { phase } => serde_json::json!({
            "event": "phase",
            "phase": phase.as_str()
        }),
        LoadProgressEvent::Resolved { table, loader } => serde_json::json!({
            "event": "resolved",
            "table": table,
            "loader": loader.as_str()
        }),
        LoadProgressEvent::Loaded {
            table,
            records,
            n,
            total,
        } => serde_json::json!({
            "event": "loaded",
            "table": table,
            "records": records,
            "n": n,
            "total": total
        }),
        LoadProgressEvent::Finished { phase, records } => serde_json::json!({
            "event": "finished",
            "phase": phase.as_str(),
            "records": records
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl LoadProgressReporter for NoProgress {
    fn report(&self, _event: LoadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn LoadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
