//! board-backup command-line entry point

use board_backup::{BackupOrchestrator, Config, ConsoleProgress, USAGE, login_from_args};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "board_backup=warn";
const VERBOSE_LOG_FILTER: &str = "board_backup=debug";

#[derive(Parser, Debug)]
#[command(
    name = "board-backup",
    version,
    about = "Back up Trello boards, attachments and backgrounds",
    override_usage = "board-backup [OPTIONS] (TOKEN_COOKIE | USERNAME PASSWORD [TOTP_SECRET])",
    after_help = "Options go before the positional arguments. Everything after the first \
positional argument is taken verbatim, including values starting with '-'."
)]
struct Cli {
    /// TOKEN_COOKIE, or USERNAME PASSWORD [TOTP_SECRET]
    #[arg(
        value_name = "ARGS",
        allow_hyphen_values = true,
        trailing_var_arg = true,
        num_args = 0..
    )]
    args: Vec<String>,

    /// Directory receiving export files and asset directories
    #[arg(long, env = "BOARD_BACKUP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Service base URL
    #[arg(long, env = "BOARD_BACKUP_BASE_URL", hide = true)]
    base_url: Option<String>,

    /// Log every request to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn usage() -> ExitCode {
    println!("{USAGE}");
    ExitCode::from(1)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => return usage(),
    };

    let Ok(login) = login_from_args(&cli.args) else {
        return usage();
    };

    init_logging(cli.verbose);

    let mut config = Config {
        output_dir: cli.output_dir,
        ..Default::default()
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: could not start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = BackupOrchestrator::new(config, login, Box::new(ConsoleProgress))
        .map(|backup| runtime.block_on(async move { backup.run().await }));

    match result.and_then(|run| run) {
        Ok(summary) => {
            tracing::info!(?summary, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
