//! Configuration of the backup agent, read once at startup.
//!
//! The file is YAML:
//!
//! ```yaml
//! cron_interval: "0 0 3 * * *"
//! heartbeat_uri: "https://status.example.com/ping/abc"
//! s3_config:
//!   access_key: AKIA...
//!   access_secret: ...
//!   region: eu-central-1
//!   bucket: sql-backups
//! databases:
//!   - host: db1.internal
//!     port: 3306
//!     username: backup
//!     password: ...
//!     name: "*"
//! ```

mod database;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

pub use database::{DatabaseConfig, DatabaseName, ALL_DATABASES_TOKEN};

use crate::scheduler::{Interval, IntervalError};

const ARCHIVE_FILE_NAME: &str = "backup.tar.gz";

/// Configuration of the whole agent.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// When to run backups. See [Interval::parse] for the accepted syntax.
    pub cron_interval: String,

    /// Pinged after every completed run. Empty means disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_uri: Option<String>,

    /// Destination bucket of the archives.
    pub s3_config: StorageConfig,

    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,

    /// Folder the per-database dumps are written to.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Folder holding the rolling archive.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Remove the archive right after a successful upload.
    ///
    /// By default the archive stays on disk until the next run starts.
    #[serde(default)]
    pub remove_archive_after_upload: bool,
}

/// Credentials and location of the S3 bucket.
#[derive(Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StorageConfig {
    pub access_key: String,
    pub access_secret: String,
    pub region: String,
    pub bucket: String,

    /// Endpoint of an S3 compatible store, e.g. MinIO.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key", &self.access_key)
            .field("access_secret", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cron_interval: "0 0 3 * * *".to_string(),
            heartbeat_uri: None,
            s3_config: StorageConfig::default(),
            databases: vec![DatabaseConfig {
                host: "localhost".to_string(),
                port: 3306,
                username: "backup".to_string(),
                password: "changeme".to_string(),
                name: Some(ALL_DATABASES_TOKEN.to_string()),
                names: Vec::new(),
            }],
            backup_dir: default_backup_dir(),
            temp_dir: default_temp_dir(),
            remove_archive_after_upload: false,
        }
    }
}

#[derive(Debug, Display, Error)]
/// Errors on loading the [Config].
pub enum ConfigError {
    /// The config file can't be read.
    #[display("Reading the config file {} failed: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// The config file is no valid YAML or misses fields.
    #[display("Parsing the config file failed: {_0}")]
    Parse(serde_yaml::Error),
    /// No config existed, a template has been written instead.
    #[display("No config file found, wrote a template to {} that needs to be filled in", _0.display())]
    TemplateWritten(#[error(ignore)] PathBuf),
    /// The backup interval can't be parsed.
    #[display("Invalid cron_interval: {_0}")]
    Interval(IntervalError),
    /// A database source is incomplete.
    #[display("Database source #{index} ({host}) is invalid: {reason}")]
    InvalidSource {
        index: usize,
        host: String,
        reason: &'static str,
    },
}

impl Config {
    /// Reads, parses and validates the config file at `path`.
    ///
    /// If the file doesn't exist, a template is written to `path` and
    /// [ConfigError::TemplateWritten] is returned.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!(target: "config", "Writing config template to {} because it doesn't exist yet", path.display());
                if let Err(template_err) = Self::write_template(path) {
                    log::warn!(target: "config", "Writing config template to {} failed: {template_err}", path.display());
                    return Err(ConfigError::Read {
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
                return Err(ConfigError::TemplateWritten(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config without validating it.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Checks the interval and every database source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval()?;

        for (index, source) in self.databases.iter().enumerate() {
            let invalid = |reason| ConfigError::InvalidSource {
                index,
                host: source.host.clone(),
                reason,
            };

            if source.host.trim().is_empty() {
                return Err(invalid("host is empty"));
            }
            if source.username.is_empty() {
                return Err(invalid("username is empty"));
            }
            if source.password.is_empty() {
                return Err(invalid("password is empty"));
            }
            if source.names.iter().any(String::is_empty) {
                return Err(invalid("names contains an empty entry"));
            }
            if source.resolved_names().is_empty() {
                return Err(invalid("neither name nor names is set"));
            }
        }

        if self.databases.is_empty() {
            log::warn!(target: "config", "No databases configured, backups will be empty");
        }

        Ok(())
    }

    /// Writes [Config::default] as YAML to `path`.
    pub fn write_template(path: &Path) -> io::Result<()> {
        let template = serde_yaml::to_string(&Self::default()).map_err(io::Error::other)?;
        fs::write(path, template)
    }

    /// Parsed [cron_interval](Self::cron_interval).
    pub fn interval(&self) -> Result<Interval, ConfigError> {
        Interval::parse(&self.cron_interval).map_err(ConfigError::Interval)
    }

    /// The heartbeat url, if one is configured.
    pub fn heartbeat_uri(&self) -> Option<&str> {
        self.heartbeat_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// Location of the rolling archive.
    pub fn archive_path(&self) -> PathBuf {
        self.temp_dir.join(ARCHIVE_FILE_NAME)
    }
}
