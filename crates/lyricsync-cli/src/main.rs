use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lyricsync_core::{AppConfig, ScrollPreset};

mod commands;
mod scenario;

#[derive(Parser)]
#[command(name = "lyricsync")]
#[command(author, version, about = "Lyric highlight and scroll synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of ~/.config/lyricsync/config.toml
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario on a virtual frame clock and print render commands
    Simulate {
        /// Scenario TOML file
        scenario: PathBuf,
        /// Override the configured scroll preset
        #[arg(short = 'p', long)]
        preset: Option<ScrollPreset>,
        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,
        /// Also print the animated offset every N frames
        #[arg(short = 'f', long)]
        frames: Option<u64>,
    },
    /// Play a scenario in real time through the sync service
    Live {
        /// Scenario TOML file
        scenario: PathBuf,
        /// Override the configured scroll preset
        #[arg(short = 'p', long)]
        preset: Option<ScrollPreset>,
    },
    /// Show the scroll duration presets
    Presets,
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)?;

    // Initialize logging; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Simulate {
            scenario,
            preset,
            json,
            frames,
        } => commands::simulate::run(&config, &scenario, preset, json, frames),
        Commands::Live { scenario, preset } => {
            commands::live::run(&config, &scenario, preset).await
        }
        Commands::Presets => commands::presets::run(&config),
        Commands::Config { init } => commands::config::run(&config, &config_path, init),
    }
}
