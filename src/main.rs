use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use handsfree::cli::{Cli, Commands, Switch};
use handsfree::client::{ApiClient, entries_after};
use handsfree::config::Config;
use handsfree::history::{HistoryEntry, Outcome};
use handsfree::recognition::RecognitionKind;
use handsfree::server::{self, ServerState};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("handsfree")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("handsfree.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Some(Commands::Serve {
            host,
            port,
            voice,
            visual,
        }) => handle_serve_command(host.as_deref(), *port, *voice, *visual, config).await,
        Some(Commands::Status) => handle_status_command(&client(cli, config)?).await,
        Some(Commands::Voice { state }) => {
            handle_toggle_command(&client(cli, config)?, RecognitionKind::Voice, *state).await
        }
        Some(Commands::Visual { state }) => {
            handle_toggle_command(&client(cli, config)?, RecognitionKind::Visual, *state).await
        }
        Some(Commands::Exec { command }) => handle_exec_command(&client(cli, config)?, &command.join(" ")).await,
        Some(Commands::History { limit, follow }) => {
            let limit = limit.unwrap_or(config.history.default_limit);
            handle_history_command(&client(cli, config)?, limit, *follow, config).await
        }
        Some(Commands::Commands) => handle_commands_command(&client(cli, config)?).await,
        Some(Commands::Dashboard) | None => {
            info!("Launching dashboard");
            handsfree::dashboard::run(
                client(cli, config)?,
                config.dashboard.tick_rate_ms,
                config.dashboard.refresh_ms,
            )
            .await
        }
    }
}

fn client(cli: &Cli, config: &Config) -> Result<ApiClient> {
    let url = cli.url.clone().unwrap_or_else(|| config.server.url());
    ApiClient::new(url).context("Failed to create HTTP client")
}

fn on_off(enabled: bool) -> ColoredString {
    if enabled { "on".green() } else { "off".dimmed() }
}

fn print_entry(entry: &HistoryEntry) {
    let outcome = match &entry.outcome {
        Outcome::Success => "success".green(),
        Outcome::Detected => "detected".cyan(),
        Outcome::UnknownCommand => "unknown command".yellow(),
        Outcome::Error(message) => format!("error: {}", message).red(),
    };
    println!(
        "{} {:<7} {} - {}",
        entry.timestamp.dimmed(),
        format!("[{}]", entry.source.as_str()),
        entry.payload,
        outcome
    );
}

async fn handle_serve_command(
    host: Option<&str>,
    port: Option<u16>,
    voice: bool,
    visual: bool,
    config: &Config,
) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = host {
        server_config.host = host.to_string();
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    let addr = server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    let controller = Arc::new(server::build_controller(config));
    if voice {
        controller.start(RecognitionKind::Voice).await;
    }
    if visual {
        controller.start(RecognitionKind::Visual).await;
    }

    println!("{} http://{}", "Serving on".green(), addr);
    let state = ServerState::new(controller, config.history.default_limit);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {}", e);
        }
    };
    server::serve(listener, state, shutdown).await.context("Server failed")?;
    println!("{}", "Server stopped".cyan());
    Ok(())
}

async fn handle_status_command(client: &ApiClient) -> Result<()> {
    let health = client.health().await.context("Failed to reach server")?;
    println!("{} {}", "Server:".green(), client.base_url());
    println!("  voice:  {}", on_off(health.voice_enabled));
    println!("  visual: {}", on_off(health.visual_enabled));
    Ok(())
}

async fn handle_toggle_command(client: &ApiClient, kind: RecognitionKind, state: Switch) -> Result<()> {
    info!("Setting {} to {:?}", kind, state);
    let result = client
        .toggle(kind, state.enabled())
        .await
        .context(format!("Failed to toggle {}", kind))?;
    let note = if result.changed { "" } else { " (unchanged)" };
    println!("{} {}{}", format!("{}:", kind).green(), on_off(result.enabled), note);
    Ok(())
}

async fn handle_exec_command(client: &ApiClient, command: &str) -> Result<()> {
    info!("Executing command: {}", command);
    let reply = client.execute(command).await.context(format!("Command '{}' failed", command))?;
    println!("{}", reply.message.green());
    Ok(())
}

async fn handle_history_command(client: &ApiClient, limit: usize, follow: bool, config: &Config) -> Result<()> {
    let mut entries = client.history(Some(limit)).await.context("Failed to fetch history")?;
    if entries.is_empty() && !follow {
        println!("{}", "No history yet".dimmed());
    }
    entries.iter().for_each(print_entry);

    if !follow {
        return Ok(());
    }

    let every = Duration::from_millis(config.dashboard.refresh_ms);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(every) => {}
        }
        let current = client.history(Some(limit)).await.context("Failed to fetch history")?;
        entries_after(entries.last(), &current).iter().for_each(print_entry);
        entries = current;
    }
}

async fn handle_commands_command(client: &ApiClient) -> Result<()> {
    let commands = client.commands().await.context("Failed to fetch commands")?;
    println!("{}", "Available commands:".green());
    for name in commands {
        println!("  {}", name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
