use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aiprofs_chat::app::App;
use aiprofs_chat::tui::{self, EventHandler, Tui};
use aiprofs_chat::{handler, ui, AssistantClient, Config};

#[derive(Parser)]
#[command(name = "aiprofs")]
#[command(about = "Chat with the AI study assistant from your terminal")]
#[command(version)]
struct Cli {
    /// Assistant API base URL (overrides AIPROFS_API_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Write debug logs to this file (overrides AIPROFS_LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Read settings from this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = Config::from_env();
    let file = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let overrides = Config {
        base_url: cli.base_url,
        log_file: cli.log_file,
    };
    let config = file.merge(overrides, env);

    let base_url = config.base_url()?.to_string();

    // The terminal owns stderr, so logs only go to a file when asked for
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    tracing::info!(%base_url, "starting chat session");

    let client = AssistantClient::new(&base_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, client).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "chat session ended with error");
    }
    result
}

async fn run(terminal: &mut Tui, client: AssistantClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aiprofs_chat=debug,aiprofs=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
