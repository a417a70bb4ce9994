use backup_account::backup::app_config::default_config_path;
use backup_account::backup::orchestrator::Orchestrator;
use backup_account::backup::params::RunParams;
use backup_account::backup::result_error::error::{EXIT_ERROR_ARGPARSE, EXIT_ERROR_CONFIG};
use backup_account::backup::run_context::RunContext;
use backup_account::backup::runner::ProcessRunner;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info, warn};

/// Backup of local or remote directories and MySQL/PostgreSQL databases
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    params: RunParams,

    /// Location of config file [default: backup.yml next to the executable]
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_ERROR_ARGPARSE } else { 0 };
            if let Err(print_error) = e.print() {
                error!("Cannot print usage: {print_error}");
            }
            exit(code);
        }
    };

    let config_path = match args.config.map_or_else(default_config_path, Ok) {
        Ok(path) => path,
        Err(e) => {
            error!("Cannot locate config file: {e}");
            exit(EXIT_ERROR_CONFIG);
        }
    };

    let ctx = match RunContext::load(&args.params, &config_path, Local::now()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{e}");
            exit(e.exit_code());
        }
    };

    match Orchestrator::new(&ctx, ProcessRunner).run() {
        Ok(report) => {
            let failed = report.failures().count();
            if failed > 0 {
                warn!(
                    "Backup of {} finished with {} failed step(s), see {:?}",
                    ctx.name(),
                    failed,
                    ctx.paths().log_last()
                );
            } else {
                info!("Backup of {} finished", ctx.name());
            }
            exit(0);
        }
        Err(e) => {
            error!("{e}");
            exit(e.exit_code());
        }
    }
}
