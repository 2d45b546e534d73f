use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pullwatch_core::{config, ChildCommand, SystemRunner, WatcherConfig};
use pullwatch_watcher::RepoWatcher;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pullwatch")]
#[command(about = "Pull new commits from a git branch and restart a program", long_about = None)]
struct Cli {
    /// Path to the local repository
    #[arg(short, long, env = "PULLWATCH_REPO", default_value = ".")]
    repo: PathBuf,

    /// Branch to track on origin
    #[arg(short, long, env = "PULLWATCH_BRANCH", default_value = config::DEFAULT_BRANCH)]
    branch: String,

    /// Seconds between checks
    #[arg(
        short,
        long,
        env = "PULLWATCH_INTERVAL",
        default_value_t = config::DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Log file, written in addition to stdout
    #[arg(long, env = "PULLWATCH_LOG", default_value = "git_pull.log")]
    log_file: PathBuf,

    /// Program (and arguments) to restart after each pull, run inside the repository
    #[arg(last = true)]
    program: Vec<String>,
}

impl Cli {
    fn watcher_config(&self) -> WatcherConfig {
        let child = self
            .program
            .split_first()
            .map(|(program, args)| ChildCommand::new(program.as_str()).with_args(args.iter().cloned()));

        WatcherConfig {
            repo_path: self.repo.clone(),
            branch: self.branch.clone(),
            poll_interval: Duration::from_secs(self.interval),
            child,
        }
    }
}

fn open_log_file(log_file: &Path) -> Result<RollingFileAppender> {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .with_context(|| format!("log file has no file name: {}", log_file.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("failed to open log file {}", log_file.display()))
}

fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let file_appender = open_log_file(log_file)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pullwatch=info,pullwatch_watcher=info,pullwatch_core=info")
        }))
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves,
/// so the watcher keeps running instead of stopping on its own.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt, Ctrl-C will not stop the watcher: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Wait for `interrupt`, failing early if the watcher task ends first.
async fn wait_for_interrupt(
    watcher: &mut JoinHandle<()>,
    interrupt: impl Future<Output = ()>,
) -> Result<()> {
    tokio::select! {
        joined = watcher => {
            joined.context("watcher task panicked")?;
            anyhow::bail!("watcher stopped without an interrupt");
        }
        () = interrupt => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _guard = init_logging(&cli.log_file)?;

    let config = cli.watcher_config();
    config.validate()?;

    let mut watcher = RepoWatcher::new(config, Arc::new(SystemRunner));
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let mut handle = tokio::task::spawn_blocking(move || watcher.run(&shutdown_rx));

    wait_for_interrupt(&mut handle, interrupted()).await?;

    info!("Interrupt received, shutting down");
    // The loop also stops on a dropped sender, so a failed send is fine.
    let _ = shutdown_tx.send(());

    handle.await.context("watcher task panicked")?;
    Ok(())
}
