use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use crishna_core::{Config, Driver, DriverOptions, Provider, Timings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "crishna")]
#[command(about = "Scripted terminal intro that turns into a chat with AI Crishna")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file with the scripted intro commands
    #[arg(long)]
    script: Option<PathBuf>,
    /// Completion backend: endpoint, openai, claude or ollama
    #[arg(short, long)]
    provider: Option<String>,
    /// URL of the chat endpoint (endpoint provider)
    #[arg(long)]
    endpoint: Option<String>,
    /// Model name for openai, claude or ollama
    #[arg(short, long)]
    model: Option<String>,
    /// Skip all playback delays
    #[arg(long)]
    no_animation: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models the selected provider offers
    Models,
    /// Write the config file with the given flags applied
    SaveConfig,
}

/// Log to a daily file next to the config; the terminal belongs to the TUI.
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = Config::get_config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "crishna.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("CRISHNA_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Command-line flags win over the file and the environment.
fn apply_flags(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(name) = &cli.provider {
        Provider::from_str(name).ok_or_else(|| {
            let known: Vec<&str> = Provider::all().iter().map(|p| p.as_str()).collect();
            anyhow!("Unknown provider '{}' (expected one of: {})", name, known.join(", "))
        })?;
        config.provider = Some(name.clone());
    }
    if let Some(url) = &cli.endpoint {
        config.endpoint_url = Some(url.clone());
    }
    if let Some(model) = &cli.model {
        config.default_model = Some(model.clone());
    }
    if let Some(script) = &cli.script {
        config.script_path = Some(script.clone());
    }
    if cli.no_animation {
        config.timings = Timings::instant();
    }

    Ok(config)
}

async fn list_models(config: &Config) -> Result<()> {
    let provider = config.provider();
    let models = config.available_models().await?;

    if models.is_empty() {
        println!("{} chooses its own model.", provider.display_name());
        return Ok(());
    }

    println!("Models for {}:", provider.display_name());
    let current = config.model();
    for model in models {
        let marker = if current.as_deref() == Some(model.as_str()) { "*" } else { " " };
        println!(" {} {}", marker, model);
    }
    Ok(())
}

/// Environment overrides are left out so API keys from the shell are never
/// written to disk.
fn save_config(config: &Config, cli: &Cli) -> Result<()> {
    let path = match &cli.config {
        Some(path) => {
            config.save_to(path)?;
            path.clone()
        }
        None => {
            config.save()?;
            Config::get_config_path()?
        }
    };
    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let file_config = load_config(&cli)?;

    match &cli.command {
        Some(Commands::SaveConfig) => return save_config(&apply_flags(file_config, &cli)?, &cli),
        Some(Commands::Models) => {
            return list_models(&apply_flags(file_config.with_env(), &cli)?).await;
        }
        None => {}
    }

    let config = apply_flags(file_config.with_env(), &cli)?;
    let driver = Driver::new(
        config.script()?,
        config.client()?,
        DriverOptions {
            timings: config.timings,
            transcript_dir: config.transcript_dir(),
        },
    );
    tracing::info!(provider = config.provider().as_str(), "starting session");

    let mut app = App::new(driver.clone(), config.provider(), config.model());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(40));

    // Redraw whenever the session changes
    let tx = events.sender();
    let mut watcher = driver.subscribe();
    tokio::spawn(async move {
        while watcher.changed().await.is_ok() {
            if tx.send(AppEvent::Session).is_err() {
                break;
            }
        }
    });

    let playback = driver.start();

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.quit();
    playback.abort();
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let cli = Cli::parse_from([
            "crishna",
            "--provider",
            "ollama",
            "--model",
            "mistral:7b",
            "--no-animation",
            "models",
        ]);
        let config = apply_flags(Config::new(), &cli).unwrap();

        assert_eq!(config.provider(), Provider::Ollama);
        assert_eq!(config.model().as_deref(), Some("mistral:7b"));
        assert_eq!(config.timings, Timings::instant());
        assert!(matches!(cli.command, Some(Commands::Models)));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let cli = Cli::parse_from(["crishna", "--provider", "gemini"]);
        let err = apply_flags(Config::new(), &cli).unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'gemini'"));
    }

    #[test]
    fn save_config_writes_the_given_path() {
        let path = std::env::temp_dir()
            .join(format!("crishna-save-config-{}", std::process::id()))
            .join("config.json");
        let cli = Cli::parse_from([
            "crishna",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "http://example.test/api/ai-chat",
            "save-config",
        ]);

        save_config(&apply_flags(Config::new(), &cli).unwrap(), &cli).unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.endpoint_url(), "http://example.test/api/ai-chat");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
