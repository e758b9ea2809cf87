use std::path::Path;

use anyhow::{Context, Result};

use lyricsync_core::AppConfig;

pub fn run(config: &AppConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
            println!("Remove it first to regenerate the defaults.");
            return Ok(());
        }
        AppConfig::default().save_to(path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    println!("# {}\n", source);
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}
