//! Scripted playback timelines for `lyricsync simulate`.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use lyricsync_core::{EngineId, LyricLine, ParsedLyrics, ScrollConfig};
use lyricsync_render::ScrollConfigExt;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Frame interval; falls back to `scroll.frame_interval_ms`
    pub tick_ms: Option<u64>,
    #[serde(default = "default_midpoint")]
    pub midpoint_px: f64,
    #[serde(default)]
    pub start_ms: u64,
    #[serde(default)]
    pub lines: Vec<ScenarioLine>,
    #[serde(default)]
    pub timeline: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioLine {
    pub timestamp_ms: u64,
    pub text: String,
    pub translation: Option<String>,
    /// Measured center of the line in list coordinates; absent means not laid out
    pub center_px: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Font,
    Window,
    Lyrics,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Advance playback and the frame clock together
    Play { duration_ms: u64 },
    /// Frames keep running while the position stands still
    Pause { duration_ms: u64 },
    /// Jump the position; the next frame observes it
    Seek { to_ms: u64 },
    /// Hand the position signal to another engine, optionally at a new position
    Handover {
        engine: EngineId,
        position_ms: Option<u64>,
    },
    /// Re-measure lines and signal a layout change
    Layout {
        reason: LayoutKind,
        /// Multiply every line center by this factor
        scale: Option<f64>,
        midpoint_px: Option<f64>,
    },
}

fn default_midpoint() -> f64 {
    100.0
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if !self.midpoint_px.is_finite() {
            bail!("midpoint_px must be a finite number");
        }
        if self.tick_ms == Some(0) {
            bail!("tick_ms must be positive");
        }
        for step in &self.timeline {
            if let Step::Layout { scale: Some(scale), .. } = step {
                if !scale.is_finite() || *scale <= 0.0 {
                    bail!("layout scale must be a positive number, got {}", scale);
                }
            }
        }
        Ok(())
    }

    pub fn lyrics(&self) -> ParsedLyrics {
        ParsedLyrics::new(
            self.lines
                .iter()
                .map(|line| {
                    let lyric = LyricLine::new(line.timestamp_ms, line.text.clone());
                    match &line.translation {
                        Some(translation) => lyric.with_translation(translation.clone()),
                        None => lyric,
                    }
                })
                .collect(),
        )
    }

    /// Frame interval for this scenario, falling back to the configured draw loop
    pub fn frame_interval(&self, config: &ScrollConfig) -> Duration {
        self.tick_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.frame_interval())
    }

    /// Line centers in timestamp order, matching the sorted lyrics
    pub fn centers(&self) -> Vec<Option<f64>> {
        let mut lines: Vec<&ScenarioLine> = self.lines.iter().collect();
        lines.sort_by_key(|line| line.timestamp_ms);
        lines.iter().map(|line| line.center_px).collect()
    }
}
