use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::DatabaseName;

/// Format of the timestamp in dump file names and object keys.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// State of a single pipeline execution.
///
/// The timestamp is taken when the run starts, so every name derived from it
/// reflects when the backup was initiated and not how long it took.
#[derive(Debug, Clone)]
pub struct BackupRun {
    started_at: DateTime<Local>,
    timestamp: String,
    files: Vec<PathBuf>,
    failures: Vec<FailedDump>,
}

/// A database whose dump failed during a [BackupRun].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDump {
    pub host: String,
    pub database: DatabaseName,
    pub error: String,
}

impl fmt::Display for FailedDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}: {}", self.database, self.host, self.error)
    }
}

impl BackupRun {
    /// Starts a run now.
    pub fn start() -> Self {
        Self::at(Local::now())
    }

    /// Starts a run with a fixed start time.
    pub fn at(started_at: DateTime<Local>) -> Self {
        let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();
        Self {
            started_at,
            timestamp,
            files: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// When the run was initiated.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Key of the uploaded archive: `sql_backup_at_{timestamp}.tar.gz`.
    pub fn object_key(&self) -> String {
        format!("sql_backup_at_{}.tar.gz", self.timestamp)
    }

    /// Dump file of `database` on `host`: `{timestamp}_{host}_{database}.sql`.
    pub fn dump_path(&self, backup_dir: &Path, host: &str, database: &DatabaseName) -> PathBuf {
        backup_dir.join(format!(
            "{}_{}_{}.sql",
            self.timestamp,
            host,
            database.file_suffix()
        ))
    }

    pub fn record_dump(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    pub fn record_failure(&mut self, host: &str, database: DatabaseName, error: impl fmt::Display) {
        self.failures.push(FailedDump {
            host: host.to_string(),
            database,
            error: error.to_string(),
        });
    }

    /// Successfully dumped files, in dump order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub(super) fn into_parts(self) -> (Vec<PathBuf>, Vec<FailedDump>) {
        (self.files, self.failures)
    }
}
