//! Scheduled backups of MySQL/MariaDB databases to S3.
//!
//! On every trigger the agent dumps the configured databases with
//! `mysqldump`, packs the dumps into a `.tar.gz`, uploads it to an S3 bucket,
//! removes the dumps and pings an optional heartbeat url.
//! The pipeline lives in [`backup`], triggering it in [`scheduler`].

#![forbid(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod scheduler;
pub mod startup;
