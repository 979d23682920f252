use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Dumps the configured databases, archives the dumps and uploads them to S3,
/// either once or on a schedule.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Run a single backup to test the configuration and exit.
    #[arg(long, short = 't')]
    pub test: bool,

    /// Configuration file.
    #[arg(long, env = "DB_BACKUP_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// `mysqldump` compatible tool used to dump the databases.
    #[arg(long, env = "DB_BACKUP_DUMP_TOOL", default_value = "mysqldump")]
    pub dump_tool: PathBuf,

    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn defaults_to_recurring_mode() {
        let cli = Cli::try_parse_from(["db_backup"]).unwrap();
        assert!(!cli.test);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.dump_tool, PathBuf::from("mysqldump"));
        assert_eq!(cli.verbose, None);
    }

    #[test]
    fn test_flag() {
        assert!(Cli::try_parse_from(["db_backup", "--test"]).unwrap().test);
        assert!(Cli::try_parse_from(["db_backup", "-t"]).unwrap().test);
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let err = Cli::try_parse_from(["db_backup", "--restore"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        // usage errors exit with status 2
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_from(["db_backup", "now"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn verbose_level() {
        let cli = Cli::try_parse_from(["db_backup", "--verbose", "debug"]).unwrap();
        assert_eq!(cli.verbose, Some(LevelFilter::Debug));
    }
}
