use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::duration::DurationModel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Constants for telling a seek apart from ordinary playback advance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Index jumps of at least this many lines are always a seek
    #[serde(default = "default_index_span_threshold")]
    pub index_span_threshold: usize,
    /// Multiplier applied to the average line interval
    #[serde(default = "default_time_multiplier")]
    pub time_multiplier: f64,
    /// Lower clamp for the dynamic time threshold
    #[serde(default = "default_min_time_threshold")]
    pub min_time_threshold_ms: u64,
    /// Upper clamp for the dynamic time threshold
    #[serde(default = "default_max_time_threshold")]
    pub max_time_threshold_ms: u64,
    /// Average interval assumed when the lyrics are too short to measure one
    #[serde(default = "default_fallback_interval")]
    pub fallback_interval_ms: u64,
    /// Gaps at or above this length (instrumental breaks) are ignored
    #[serde(default = "default_outlier_gap")]
    pub outlier_gap_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            index_span_threshold: default_index_span_threshold(),
            time_multiplier: default_time_multiplier(),
            min_time_threshold_ms: default_min_time_threshold(),
            max_time_threshold_ms: default_max_time_threshold(),
            fallback_interval_ms: default_fallback_interval(),
            outlier_gap_ms: default_outlier_gap(),
        }
    }
}

/// Lyric list scrolling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Animate ordinary line advances (false = always snap)
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    /// Named duration/easing preset
    #[serde(default)]
    pub preset: ScrollPreset,
    /// Displacements below this are snapped instead of animated
    #[serde(default = "default_min_motion")]
    pub min_motion_px: f64,
    /// Draw-loop interval
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth_enabled: default_true(),
            preset: ScrollPreset::default(),
            min_motion_px: default_min_motion(),
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl ScrollConfig {
    /// Duration model for the configured preset
    pub fn duration_model(&self) -> DurationModel {
        self.preset.model()
    }
}

/// Easing curve applied to animated scrolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingType {
    /// Jump at the end of the transition
    None,
    Linear,
    /// 1 - (1-t)^3
    #[default]
    Cubic,
    /// 1 - (1-t)^5
    Quintic,
    /// 1 - 2^(-10t)
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
}

impl EasingType {
    /// CSS timing-function equivalent of this curve
    pub fn css(&self) -> &'static str {
        match self {
            EasingType::None => "step-end",
            EasingType::Linear => "linear",
            EasingType::Cubic => "cubic-bezier(0.33, 1, 0.68, 1)",
            EasingType::Quintic => "cubic-bezier(0.22, 1, 0.36, 1)",
            EasingType::EaseOut => "cubic-bezier(0.16, 1, 0.3, 1)",
            EasingType::EaseInOut => "cubic-bezier(0.65, 0, 0.35, 1)",
        }
    }
}

/// Named duration presets. All share the same formula and differ only in constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollPreset {
    Snappy,
    #[default]
    Smooth,
    Gentle,
    Linear,
}

impl ScrollPreset {
    pub const ALL: [ScrollPreset; 4] = [
        ScrollPreset::Snappy,
        ScrollPreset::Smooth,
        ScrollPreset::Gentle,
        ScrollPreset::Linear,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScrollPreset::Snappy => "snappy",
            ScrollPreset::Smooth => "smooth",
            ScrollPreset::Gentle => "gentle",
            ScrollPreset::Linear => "linear",
        }
    }

    /// Resolve the preset to its `{easing, base, k, min, max}` constants
    pub fn model(&self) -> DurationModel {
        match self {
            ScrollPreset::Snappy => DurationModel::new(EasingType::Cubic, 160.0, 0.5, 120, 360),
            ScrollPreset::Smooth => DurationModel::new(EasingType::Quintic, 280.0, 0.7, 240, 640),
            ScrollPreset::Gentle => DurationModel::new(EasingType::EaseInOut, 400.0, 0.9, 360, 900),
            ScrollPreset::Linear => DurationModel::new(EasingType::Linear, 240.0, 0.6, 200, 560),
        }
    }
}

impl fmt::Display for ScrollPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScrollPreset {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| crate::Error::UnknownPreset(s.to_string()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_index_span_threshold() -> usize {
    3
}

fn default_time_multiplier() -> f64 {
    2.5
}

fn default_min_time_threshold() -> u64 {
    2000
}

fn default_max_time_threshold() -> u64 {
    10_000
}

fn default_fallback_interval() -> u64 {
    5000
}

fn default_outlier_gap() -> u64 {
    60_000 // instrumental breaks
}

fn default_min_motion() -> f64 {
    1.0
}

fn default_frame_interval() -> u64 {
    16 // ~60fps
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults if absent
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/lyricsync/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("lyricsync")
            .join("config.toml")
    }
}
