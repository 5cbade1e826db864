//! `TaskDeck` — terminal-native task list with live synchronization.
//!
//! Launches the TUI against a local collection provider. Configuration via
//! CLI flags, environment variables, or config file
//! (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # In-memory tasks
//! cargo run --bin taskdeck
//!
//! # Persist tasks to a JSON file
//! cargo run --bin taskdeck -- --data-file ~/.local/share/taskdeck/tasks.json
//!
//! # Or via environment variables
//! TASKDECK_USER=ada TASKDECK_NAME="Ada Lovelace" cargo run
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::app::App;
use taskdeck::config::{CliArgs, ClientConfig};
use taskdeck::prefs::Prefs;
use taskdeck::services::memory::{MemoryCollection, MemoryIdentity};
use taskdeck::sync::{self, SyncCommand, SyncEvent};
use taskdeck::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("taskdeck starting");

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &config).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("taskdeck exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown to
/// ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> io::Result<()> {
    let prefs = Prefs::load(None);
    let mut app = App::new(config, prefs);
    let mut stored_prefs = prefs;

    let collection = match &config.data_file {
        Some(path) => MemoryCollection::with_persistence(path.clone())?,
        None => MemoryCollection::new(),
    };
    let identity = MemoryIdentity::new(config.auth_profile());
    let (cmd_tx, mut evt_rx) = sync::spawn_sync(
        Arc::new(collection),
        Arc::new(identity),
        config.to_sync_config(),
    );

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending sync events (non-blocking).
        while let Ok(sync_event) = evt_rx.try_recv() {
            app.apply_sync_event(sync_event);
        }

        // Step 3: Expire stale notices.
        app.tick();

        // Step 4: Persist preferences when the theme was toggled.
        if stored_prefs.dark_mode != app.dark_mode {
            stored_prefs = Prefs {
                dark_mode: app.dark_mode,
            };
            stored_prefs.store(None);
        }

        // Step 5: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(cmd) = app.handle_key_event(key) {
                match cmd_tx.try_send(cmd) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        app.apply_sync_event(SyncEvent::Notice {
                            level: taskdeck::sync::NoticeLevel::Error,
                            text: "Busy, try again".to_string(),
                        });
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::error!("sync loop is gone, quitting");
                        app.should_quit = true;
                    }
                }
            }
        }

        if app.should_quit {
            let _ = cmd_tx.try_send(SyncCommand::Shutdown);
            return Ok(());
        }
    }
}
