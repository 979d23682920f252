//! Checks and preparations before the first run.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use derive_more::{Display, Error};

use crate::backup::{DumpError, MySqlDump, Pipeline, UploadError, Uploader};
use crate::config::{Config, ConfigError};
use crate::scheduler::Scheduler;

#[derive(Debug, Display, Error)]
/// Errors that prevent the agent from starting.
pub enum StartupError {
    /// The dump tool is missing or broken.
    #[display("Error running dump tool: {_0}")]
    DumpTool(DumpError),
    /// The config can't be loaded.
    #[display("{_0}")]
    Config(ConfigError),
    /// The S3 client can't be created.
    #[display("{_0}")]
    Storage(UploadError),
}

/// Prepares a [Scheduler] from the dump tool and the config file.
///
/// The dump tool is checked before anything else, so a missing tool leaves
/// the file system untouched.
pub fn bootstrap(dump_tool: &Path, config_path: &Path) -> Result<Scheduler, StartupError> {
    let dumper = MySqlDump::new(dump_tool);
    dumper.check_available().map_err(StartupError::DumpTool)?;

    log::info!(target: "startup", "Loading configuration file {}", config_path.display());
    let config = Config::load(config_path).map_err(StartupError::Config)?;
    let interval = config.interval().map_err(StartupError::Config)?;

    ensure_dir(&config.backup_dir, "Backup");
    ensure_dir(&config.temp_dir, "Temp");

    let uploader = Uploader::from_config(&config.s3_config).map_err(StartupError::Storage)?;

    let pipeline = Pipeline::new(Arc::new(config), Arc::new(dumper), uploader);
    Ok(Scheduler::new(interval, pipeline))
}

/// Creates `dir` if it doesn't exist yet. Failures are only logged.
pub fn ensure_dir(dir: &Path, purpose: &str) {
    if dir.is_dir() {
        return;
    }

    log::info!(target: "startup", "{purpose} directory {} not found! Creating it.", dir.display());
    if let Err(e) = fs::create_dir_all(dir) {
        log::error!(target: "startup", "Creating {purpose} directory {} failed: {e}", dir.display());
    }
}
