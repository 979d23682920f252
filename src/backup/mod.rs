//! The backup pipeline: dump → archive → upload → cleanup → heartbeat.
//!
//! - [dump]: one dump file per database using an external tool.
//! - [archive]: `.tar.gz` of all dumps of a run.
//! - [upload]: puts the archive into the S3 bucket.
//! - [cleanup]: removes dumps and the previous archive.
//! - [heartbeat]: pings a monitoring endpoint.

pub mod archive;
pub mod cleanup;
pub mod dump;
pub mod heartbeat;
mod run;
pub mod upload;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use derive_more::{Display, Error};

pub use archive::{archive, ArchiveError};
pub use dump::{Dump, DumpError, MySqlDump};
pub use heartbeat::Heartbeat;
pub use run::{BackupRun, FailedDump, TIMESTAMP_FORMAT};
pub use upload::{UploadError, Uploader};

use crate::config::Config;

#[derive(Debug, Display, Error)]
/// Errors that abort a run.
///
/// Failing dumps are no [RunError], they are reported in the [RunSummary].
pub enum RunError {
    /// The archive file can't be created.
    #[display("Creating the archive {} failed: {source}", path.display())]
    CreateArchive { path: PathBuf, source: io::Error },
    /// Writing the archive failed.
    #[display("Error creating archive: {_0}")]
    Archive(ArchiveError),
    /// Uploading the archive failed.
    #[display("Error uploading backup: {_0}")]
    Upload(UploadError),
    /// A blocking stage of the run didn't finish.
    #[display("Backup task aborted: {_0}")]
    Task(tokio::task::JoinError),
}

/// Outcome of a run that reached the bucket.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Key of the uploaded archive.
    pub key: String,
    /// Dumps that made it into the archive.
    pub archived: Vec<PathBuf>,
    /// Databases missing from the archive.
    pub failed: Vec<FailedDump>,
    /// Size of the uploaded archive in bytes.
    pub size: u64,
}

impl RunSummary {
    /// Whether at least one database is missing from the archive.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Everything needed to execute runs. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    dumper: Arc<dyn Dump>,
    uploader: Uploader,
    heartbeat: Option<Heartbeat>,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, dumper: Arc<dyn Dump>, uploader: Uploader) -> Self {
        let heartbeat = config.heartbeat_uri().map(Heartbeat::new);
        Self {
            config,
            dumper,
            uploader,
            heartbeat,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executes a run starting now.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        self.execute(BackupRun::start()).await
    }

    /// Executes `run`.
    ///
    /// Dumps that fail are logged and left out of the archive. Archive and
    /// upload errors abort the run before dumps are cleaned up and before the
    /// heartbeat is sent.
    pub async fn execute(&self, run: BackupRun) -> Result<RunSummary, RunError> {
        log::info!(
            target: "backup",
            "Starting backup jobs (run initiated {})",
            run.started_at().format("%Y-%m-%d %H:%M:%S")
        );

        let archive_path = self.config.archive_path();

        // dumping and archiving block on processes and files
        let stage = self.clone();
        let run = tokio::task::spawn_blocking(move || stage.dump_and_archive(run))
            .await
            .map_err(RunError::Task)??;

        log::info!(target: "upload", "Uploading to S3 bucket {}", self.uploader.bucket());
        let key = run.object_key();
        let size = self
            .uploader
            .upload(&archive_path, &key)
            .await
            .map_err(RunError::Upload)?;
        log::info!(target: "upload", "Successfully uploaded backup to S3 as {key} ({size} bytes)");

        let (archived, failed) = run.into_parts();
        let stage = self.clone();
        let archived = tokio::task::spawn_blocking(move || stage.clean_up(archived))
            .await
            .map_err(RunError::Task)?;

        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.send().await;
        }

        let summary = RunSummary {
            key,
            archived,
            failed,
            size,
        };
        if summary.is_partial() {
            log::warn!(
                target: "backup",
                "Backup {} is missing {} database(s):",
                summary.key,
                summary.failed.len()
            );
            for failure in &summary.failed {
                log::warn!(target: "backup", "  {failure}");
            }
        } else {
            log::info!(target: "backup", "Finished backup of {} database(s)", summary.archived.len());
        }

        Ok(summary)
    }

    fn dump_and_archive(&self, mut run: BackupRun) -> Result<BackupRun, RunError> {
        cleanup::remove_previous_archive(&self.config.archive_path());
        self.dump_all(&mut run);
        self.write_archive(&run)?;
        Ok(run)
    }

    /// Removes what was uploaded. Returns `archived` for the summary.
    fn clean_up(&self, archived: Vec<PathBuf>) -> Vec<PathBuf> {
        cleanup::remove_dumps(&archived);
        if self.config.remove_archive_after_upload {
            cleanup::remove_archive(&self.config.archive_path());
        }
        archived
    }

    /// Dumps every database one after another.
    fn dump_all(&self, run: &mut BackupRun) {
        for source in &self.config.databases {
            for database in source.resolved_names() {
                log::info!(target: "dump", "Backing up database {database} on host {}", source.host);

                let destination = run.dump_path(&self.config.backup_dir, &source.host, &database);
                match self.dumper.dump(source, &database, &destination) {
                    Ok(()) => run.record_dump(destination),
                    Err(e) => {
                        log::error!(target: "dump", "Error running backup of {database} on host {}: {e}", source.host);
                        cleanup::remove_partial_dump(&destination);
                        run.record_failure(&source.host, database, e);
                    }
                }
            }
        }
    }

    fn write_archive(&self, run: &BackupRun) -> Result<(), RunError> {
        log::info!(target: "archive", "Compressing backup files");
        if run.files().is_empty() {
            log::warn!(target: "archive", "No dump succeeded, the archive will be empty");
        }

        let path = self.config.archive_path();
        let out = File::create(&path).map_err(|source| RunError::CreateArchive {
            path: path.clone(),
            source,
        })?;

        archive(run.files(), out).map_err(RunError::Archive)?;
        log::info!(target: "archive", "Compressed {} backup file(s) into {}", run.files().len(), path.display());

        Ok(())
    }
}
