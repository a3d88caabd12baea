mod commands;
mod dir_watcher;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use starlog_core::context::ConfyStore;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

/// Directory for daily rolling log files; stderr when unset.
const LOG_DIR_ENV: &str = "STARLOG_LOG_DIR";

#[derive(Parser)]
#[command(version, about = "Journal tailer and star-system map")]
struct Cli {
    /// Journal directory. Defaults to the configured one, then the game's.
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,
    /// Use `,` as the decimal separator
    #[arg(long, global = true)]
    european: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the latest session, then follow the journal live
    Watch {
        /// Start from an empty session instead of replaying history
        #[arg(long)]
        no_seed: bool,
    },
    /// Print the body tree of the most recent system
    System,
    /// List journal session groups
    Sessions,
    /// Show the stored configuration
    Config,
    /// Remember a journal directory
    SetDirectory { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let _guard = init_logging();
    let cli = Cli::parse();

    let store = Arc::new(ConfyStore::load().map_err(|e| e.to_string())?);
    let options = commands::Options {
        directory: cli.dir,
        european: cli.european,
    };

    match cli.command {
        Commands::Watch { no_seed } => dir_watcher::watch(store, &options, !no_seed).await,
        Commands::System => commands::show_system(&store, &options).await,
        Commands::Sessions => commands::list_sessions(&store, &options).await,
        Commands::Config => commands::show_config(&store),
        Commands::SetDirectory { path } => commands::set_directory(&store, &path),
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
        let appender = tracing_appender::rolling::daily(dir, "starlog.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        return Some(guard);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    None
}
