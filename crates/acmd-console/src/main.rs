mod config;
mod reasoning;
mod state;
mod theme;
mod ui;

use acmd_core::seed::{default_feed, default_roster, load_roster};
use acmd_core::{LogFeed, Registry};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "acmd", about = "Terminal command deck for an autonomous agent fleet")]
struct Cli {
    /// Config file; defaults to $ACMD_CONFIG_PATH or ~/.config/acmd/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Roster JSON replacing the built-in fleet.
    #[arg(long)]
    roster: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config_path = cli.config.unwrap_or_else(config::config_path);
    let mut config = config::load_config(&config_path)?;
    config.apply_env_overrides();
    if let Some(roster) = cli.roster {
        config.roster_path = Some(roster);
    }

    let mut feed = LogFeed::default();
    let seed = match &config.roster_path {
        Some(path) => load_roster(path)
            .with_context(|| format!("Failed to load roster {}", path.display()))?,
        None => {
            feed.extend(default_feed());
            default_roster()
        }
    };
    let registry = Registry::from_seed(seed).context("Roster rejected")?;
    info!(agents = registry.len(), config = %config_path.display(), "roster loaded");

    let (job_tx, job_rx) = mpsc::channel(reasoning::JOB_QUEUE_CAPACITY);
    let (result_tx, mut result_rx) = mpsc::channel(reasoning::JOB_QUEUE_CAPACITY);
    let backend = Arc::new(reasoning::ReasoningBackend::from_config(&config.reasoning));
    let timeout = Duration::from_secs(config.reasoning.timeout_secs.max(1));
    tokio::spawn(reasoning::run_worker(backend, timeout, job_rx, result_tx));

    let mut app = state::App::new(registry, feed, job_tx);
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, &config, &mut result_rx).await;
    restore_terminal(&mut terminal)?;

    if let Err(err) = result {
        eprintln!("acmd: {err:#}");
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = std::env::var_os("ACMD_LOG_FILE") {
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
            return;
        }
    }
    let stdout_enabled = std::env::var("ACMD_LOG_STDOUT")
        .ok()
        .and_then(|value| config::parse_bool_flag(&value))
        .unwrap_or(false);
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut state::App,
    config: &config::ConsoleConfig,
    results: &mut mpsc::Receiver<reasoning::ReasoningOutcome>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut render_ticker =
        tokio::time::interval(Duration::from_millis(config.render_tick_ms()));
    let metrics_period = Duration::from_millis(config.metrics_tick_ms());
    let mut metrics_ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + metrics_period, metrics_period);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            _ = render_ticker.tick() => {}
            _ = metrics_ticker.tick() => {
                app.on_metrics_tick();
            }
            Some(outcome) = results.recv() => {
                app.apply_reasoning(outcome);
            }
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Terminal event stream failed"),
                None => break,
            },
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
