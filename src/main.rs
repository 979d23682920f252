use std::process::ExitCode;

use clap::Parser;
use db_backup_lib::cli::Cli;
use db_backup_lib::scheduler::{shutdown, Scheduler};
use db_backup_lib::startup;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    env_logger.init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!(target: "startup", "Starting the async runtime failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    // http clients are created during bootstrap
    let scheduler = {
        let _guard = runtime.enter();
        match startup::bootstrap(&cli.dump_tool, &cli.config) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                log::error!(target: "startup", "{e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let exit_code = if cli.test {
        runtime.block_on(run_once(scheduler))
    } else {
        runtime.block_on(run_forever(scheduler))
    };

    // don't wait for a run that is still in progress
    runtime.shutdown_background();
    exit_code
}

async fn run_once(scheduler: Scheduler) -> ExitCode {
    match scheduler.run_once().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: "backup", "{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_forever(scheduler: Scheduler) -> ExitCode {
    log::info!(target: "scheduler", "Starting cronjob to run backups");

    let cancel = CancellationToken::new();
    let mut backups = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run_forever(cancel).await }
    });

    tokio::select! {
        res = &mut backups => match res {
            Ok(Ok(())) => ExitCode::SUCCESS,
            Ok(Err(e)) => {
                log::error!(target: "backup", "{e}");
                ExitCode::FAILURE
            }
            Err(e) => {
                log::error!(target: "scheduler", "Scheduler task failed: {e}");
                ExitCode::FAILURE
            }
        },
        signal = shutdown::wait_for_signal() => {
            cancel.cancel();
            match signal {
                Ok(name) => {
                    log::info!(target: "scheduler", "Received {name}, shutting down");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!(target: "scheduler", "Listening for termination signals failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
