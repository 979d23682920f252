//! Dumps single databases with an external dump tool.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use derive_more::{Display, Error};

use crate::config::{DatabaseConfig, DatabaseName};

const DEFAULT_DUMP_TOOL: &str = "mysqldump";

/// Produces a dump file of one database.
pub trait Dump: Send + Sync {
    /// Dumps `database` of `source` into `destination`.
    ///
    /// On error `destination` may be missing or hold a partial dump.
    fn dump(
        &self,
        source: &DatabaseConfig,
        database: &DatabaseName,
        destination: &Path,
    ) -> Result<(), DumpError>;
}

#[derive(Debug, Display, Error)]
/// Errors of a [Dump].
pub enum DumpError {
    /// The dump tool couldn't be started.
    #[display("Running {} failed: {source}", tool.display())]
    NotRun { tool: PathBuf, source: io::Error },
    /// The dump tool exited unsuccessfully.
    #[display("{} exited with {status}: {stderr}", tool.display())]
    Failed {
        tool: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// [Dump] using `mysqldump` or a compatible tool like `mariadb-dump`.
#[derive(Debug, Clone)]
pub struct MySqlDump {
    tool: PathBuf,
}

impl Default for MySqlDump {
    fn default() -> Self {
        Self::new(DEFAULT_DUMP_TOOL)
    }
}

impl MySqlDump {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// Checks that the dump tool can be executed by running `<tool> --help`.
    pub fn check_available(&self) -> Result<(), DumpError> {
        let output = Command::new(&self.tool)
            .arg("--help")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DumpError::NotRun {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DumpError::Failed {
                tool: self.tool.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        log::trace!(target: "dump", "{} is available", self.tool.display());
        Ok(())
    }

    fn command(
        &self,
        source: &DatabaseConfig,
        database: &DatabaseName,
        destination: &Path,
    ) -> Command {
        let mut command = Command::new(&self.tool);
        command
            .arg(format!("--host={}", source.host))
            .arg(format!("--port={}", source.port))
            .arg(format!("--user={}", source.username))
            .arg(format!("--password={}", source.password))
            .arg(format!("--result-file={}", destination.display()))
            .arg("--extended-insert")
            .arg("--single-transaction=TRUE")
            .arg(database.dump_arg())
            .stdin(Stdio::null());
        command
    }
}

impl Dump for MySqlDump {
    fn dump(
        &self,
        source: &DatabaseConfig,
        database: &DatabaseName,
        destination: &Path,
    ) -> Result<(), DumpError> {
        log::debug!(target: "dump", "Dumping {database} on {}:{} to {}", source.host, source.port, destination.display());

        let output = self
            .command(source, database, destination)
            .output()
            .map_err(|source| DumpError::NotRun {
                tool: self.tool.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DumpError::Failed {
                tool: self.tool.clone(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        // relay stderr
        if !stderr.trim().is_empty() {
            log::warn!(target: "dump", "{}", stderr.trim());
        }

        Ok(())
    }
}
