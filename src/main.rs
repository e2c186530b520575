//! # Supervisor TUI Entry Point
//!
//! This is the main entry point for the Supervisor dashboard.
//!
//! ## Overview
//!
//! The dashboard lists every process managed by Supervisor and lets you
//! start, stop, restart and clear the logs of each one, or tail its stdout
//! and stderr, without leaving the terminal.
//!
//! ## Usage
//!
//! ```bash
//! # Use supervisorctl's own defaults
//! supervisor-tui
//!
//! # Talk to a specific supervisord
//! supervisor-tui --server-url unix:///var/run/supervisor.sock
//!
//! # Debug mode - print the process list as JSON and exit
//! supervisor-tui --debug
//! ```
//!
//! ## Key Bindings
//!
//! - `Esc` - Leave the current page (quits from the process list)
//! - `Tab` - Switch focus between the header buttons and the table
//! - `Left` / `Right` - Change the selected button
//! - `Up` / `Down` - Change the selected process
//! - `PgUp` / `PgDn` - Scroll the table
//! - `Enter` - Run the selected button
//! - `Ctrl+c` - Quit from anywhere

use supervisor_tui::config::Config;
use supervisor_tui::supervisor::{Supervisor, Supervisorctl};
use supervisor_tui::ui::{CrosstermEventReader, ProcessListPage, Screen, UiError};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::future::Future;
use std::io;
use std::panic;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SUPERVISOR_TUI_LOG";
const LOG_FILE: &str = "supervisor-tui.log";

/// Supervisor TUI - a terminal dashboard for Supervisor-managed processes
#[derive(Parser, Debug)]
#[command(name = "supervisor-tui")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A keyboard-driven terminal dashboard for Supervisor", long_about = None)]
struct Args {
    /// Path to an alternate configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Supervisord URL passed to supervisorctl as `-s`
    #[arg(short = 's', long, value_name = "URL")]
    server_url: Option<String>,

    /// Supervisord configuration file passed to supervisorctl as `-c`
    #[arg(long, value_name = "FILE")]
    supervisor_config: Option<PathBuf>,

    /// Print the process list as JSON and exit
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(url) = &self.server_url {
            config.server_url = Some(url.clone());
        }
        if let Some(path) = &self.supervisor_config {
            config.supervisor_config = Some(path.clone());
        }

        Ok(config)
    }
}

/// Route `tracing` output to a file, since stdout belongs to the TUI. Returns
/// `None` (logging disabled) when no data directory can be resolved.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;

    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    let config = args.load_config()?;
    let _log_guard = init_tracing(&config);

    let supervisor = Supervisorctl::from_config(&config);

    if args.debug {
        return print_processes(&supervisor).await;
    }

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);

        original_hook(panic_info);
    }));

    let result = run_application(&config, &supervisor).await;

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

async fn print_processes<S: Supervisor>(supervisor: &S) -> Result<()> {
    let processes = supervisor
        .list_processes()
        .await
        .context("Failed to list processes")?;

    let json =
        serde_json::to_string_pretty(&processes).context("Failed to serialize process list")?;
    println!("{json}");

    Ok(())
}

async fn run_application<S: Supervisor>(config: &Config, supervisor: &S) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide).context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    let mut screen = Screen::new(terminal, Box::new(CrosstermEventReader));

    info!(tick_ms = config.tick_ms, "starting dashboard");

    // Run the pages and ensure cleanup happens even on error
    let run_result = run_pages(&mut screen, config, supervisor).await;

    // Restore terminal (always runs, even if the pages failed)
    let cleanup_result = cleanup_terminal(&mut screen);

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    Ok(())
}

async fn run_pages<S: Supervisor>(
    screen: &mut Screen<CrosstermBackend<io::Stdout>>,
    config: &Config,
    supervisor: &S,
) -> Result<()> {
    screen
        .initialize()
        .context("Failed to initialize screen")?;

    let mut page = ProcessListPage::new(config.tick());
    let pages = page.run(screen, supervisor);
    match race_interrupt(pages, tokio::signal::ctrl_c()).await {
        Ok(()) | Err(UiError::Interrupted) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Run `pages` until they finish or `interrupt` fires. An external SIGINT
/// unwinds the same way as Ctrl+C read as a key, so the terminal is restored.
async fn race_interrupt<P, I>(pages: P, interrupt: I) -> Result<(), UiError>
where
    P: Future<Output = Result<(), UiError>>,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(pages);

    tokio::select! {
        result = &mut pages => result,
        signal = interrupt => match signal {
            Ok(()) => {
                info!("interrupt signal received");
                Err(UiError::Interrupted)
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for interrupt signal");
                pages.await
            }
        },
    }
}

/// Clean up terminal state
fn cleanup_terminal(screen: &mut Screen<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(screen.backend_mut(), LeaveAlternateScreen, Show)
        .context("Failed to restore terminal")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_args_parsing_without_flags() {
        let args = Args::try_parse_from(["supervisor-tui"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.server_url.is_none());
        assert!(args.supervisor_config.is_none());
        assert!(!args.debug);
    }

    #[test]
    fn test_args_parsing_with_overrides() {
        let args = Args::try_parse_from([
            "supervisor-tui",
            "--server-url",
            "unix:///tmp/supervisor.sock",
            "--supervisor-config",
            "/etc/supervisord.conf",
            "--debug",
        ])
        .unwrap();

        assert_eq!(
            args.server_url.as_deref(),
            Some("unix:///tmp/supervisor.sock")
        );
        assert_eq!(
            args.supervisor_config,
            Some(PathBuf::from("/etc/supervisord.conf"))
        );
        assert!(args.debug);
    }

    #[test]
    fn test_args_rejects_positional_arguments() {
        assert!(Args::try_parse_from(["supervisor-tui", "extra"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"server_url": "http://localhost:9001", "tick_ms": 25}"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "supervisor-tui",
            "--config",
            path.to_str().unwrap(),
            "-s",
            "unix:///tmp/override.sock",
        ])
        .unwrap();
        let config = args.load_config().unwrap();

        assert_eq!(config.server_url.as_deref(), Some("unix:///tmp/override.sock"));
        assert_eq!(config.tick_ms, 25);
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let args =
            Args::try_parse_from(["supervisor-tui", "--config", path.to_str().unwrap()]).unwrap();
        assert!(args.load_config().is_err());
    }

    #[tokio::test]
    async fn test_interrupt_signal_stops_pages() {
        let result = race_interrupt(std::future::pending(), async { Ok::<(), io::Error>(()) }).await;
        assert!(matches!(result, Err(UiError::Interrupted)));
    }

    #[tokio::test]
    async fn test_pages_finish_without_signal() {
        let result = race_interrupt(async { Ok::<(), UiError>(()) }, std::future::pending()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_signal_listener_failure_keeps_pages_running() {
        let pages = async {
            tokio::task::yield_now().await;
            Err(UiError::InvalidAction("x".to_string()))
        };
        let result = race_interrupt(pages, async { Err(io::Error::other("no signals")) }).await;
        assert!(matches!(result, Err(UiError::InvalidAction(_))));
    }
}
