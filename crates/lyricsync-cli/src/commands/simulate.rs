use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use lyricsync_core::position::sanitize_position;
use lyricsync_core::{
    AppConfig, FixedPosition, HighlightChange, Layout, LayoutReason, LyricSync, ParsedLyrics,
    RenderCommand, RenderSink, ScrollPreset, SharedGeometry, TracingObserver, TransformCommand,
};
use lyricsync_render::TransformAnimator;

use crate::scenario::{LayoutKind, Scenario, Step};

/// One line of simulation output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Render {
        time_ms: u64,
        position_ms: u64,
        command: RenderCommand,
    },
    Sample {
        time_ms: u64,
        offset_px: f64,
        highlighted: Option<usize>,
    },
}

/// Render sink that both records commands and drives the animator
#[derive(Default)]
struct Tap {
    animator: TransformAnimator,
    pending: Vec<RenderCommand>,
}

impl RenderSink for Tap {
    fn on_transform(&mut self, command: TransformCommand) {
        self.pending.push(RenderCommand::Transform(command));
        self.animator.on_transform(command);
    }

    fn on_highlight_change(&mut self, change: HighlightChange) {
        self.pending.push(RenderCommand::Highlight(change));
        self.animator.on_highlight_change(change);
    }
}

/// Replays a scenario on a virtual frame clock
pub struct Simulation {
    sync: LyricSync,
    geometry: SharedGeometry,
    base_centers: Vec<Option<f64>>,
    tap: Tap,
    tick_ms: u64,
    sample_every: Option<u64>,
    now_ms: u64,
    frames: u64,
    position: FixedPosition,
    entries: Vec<Entry>,
}

impl Simulation {
    pub fn new(scenario: &Scenario, config: &AppConfig, sample_every: Option<u64>) -> Self {
        let mut sync = LyricSync::new(config).with_observer(Box::new(TracingObserver));
        sync.load_lyrics(Arc::new(scenario.lyrics()), scenario.start_ms);

        let base_centers = scenario.centers();
        let geometry = SharedGeometry::new();
        geometry.replace(base_centers.clone(), scenario.midpoint_px);

        Self {
            sync,
            geometry,
            base_centers,
            tap: Tap::default(),
            tick_ms: (scenario.frame_interval(&config.scroll).as_millis() as u64).max(1),
            sample_every: sample_every.filter(|n| *n > 0),
            now_ms: 0,
            frames: 0,
            position: FixedPosition::new(scenario.start_ms as f64),
            entries: Vec::new(),
        }
    }

    pub fn run(mut self, steps: &[Step]) -> Vec<Entry> {
        // first frame observes the start position
        self.frame();
        for step in steps {
            self.step(step);
        }
        // let the last highlight and animation land
        self.frame();
        while self.tap.animator.is_animating() {
            self.frame();
        }
        self.entries
    }

    fn step(&mut self, step: &Step) {
        tracing::debug!(?step, now_ms = self.now_ms, "Scenario step");
        match *step {
            Step::Play { duration_ms } => self.advance(duration_ms, true),
            Step::Pause { duration_ms } => self.advance(duration_ms, false),
            Step::Seek { to_ms } => {
                self.position.position_ms = to_ms as f64;
                self.frame();
            }
            Step::Handover { engine, position_ms } => {
                self.position.engine = engine;
                if let Some(position_ms) = position_ms {
                    self.position.position_ms = position_ms as f64;
                }
                self.frame();
            }
            Step::Layout {
                reason,
                scale,
                midpoint_px,
            } => {
                if let Some(scale) = scale {
                    let centers = self.base_centers.iter().map(|c| c.map(|c| c * scale)).collect();
                    let midpoint_px =
                        midpoint_px.unwrap_or_else(|| self.geometry.container_midpoint_px());
                    self.geometry.replace(centers, midpoint_px);
                } else if let Some(midpoint_px) = midpoint_px {
                    self.geometry.set_midpoint(midpoint_px);
                }
                let reason = match reason {
                    LayoutKind::Font => LayoutReason::Font,
                    LayoutKind::Window => LayoutReason::Window,
                    LayoutKind::Lyrics => LayoutReason::Lyrics,
                };
                self.sync
                    .layout_changed(reason, &self.geometry, &self.geometry, &mut self.tap);
                self.drain();
            }
        }
    }

    fn advance(&mut self, duration_ms: u64, playing: bool) {
        let frames = duration_ms.div_ceil(self.tick_ms);
        for _ in 0..frames {
            if playing {
                self.position.position_ms += self.tick_ms as f64;
            }
            self.frame();
        }
    }

    fn frame(&mut self) {
        self.now_ms += self.tick_ms;
        self.frames += 1;
        self.tap.animator.update(self.now_ms);

        self.sync
            .tick(&self.position, &self.geometry, &self.geometry, &mut self.tap);
        self.drain();

        let offset_px = self.tap.animator.update(self.now_ms);
        if let Some(n) = self.sample_every {
            if self.frames % n == 0 {
                self.entries.push(Entry::Sample {
                    time_ms: self.now_ms,
                    offset_px,
                    highlighted: self.tap.animator.highlighted(),
                });
            }
        }
    }

    fn drain(&mut self) {
        let position_ms = sanitize_position(self.position.position_ms);
        for command in self.tap.pending.drain(..) {
            self.entries.push(Entry::Render {
                time_ms: self.now_ms,
                position_ms,
                command,
            });
        }
    }
}

pub fn run(
    config: &AppConfig,
    path: &Path,
    preset: Option<ScrollPreset>,
    json: bool,
    frames: Option<u64>,
) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let mut config = config.clone();
    if let Some(preset) = preset {
        config.scroll.preset = preset;
    }

    let lyrics = scenario.lyrics();
    let entries = Simulation::new(&scenario, &config, frames).run(&scenario.timeline);

    if json {
        for entry in &entries {
            println!("{}", serde_json::to_string(entry)?);
        }
        return Ok(());
    }

    println!(
        "Scenario {} ({} lines, preset {})\n",
        path.display(),
        lyrics.len(),
        config.scroll.preset
    );
    for entry in &entries {
        println!("{}", describe(entry, &lyrics));
    }
    Ok(())
}

fn describe(entry: &Entry, lyrics: &ParsedLyrics) -> String {
    let text = |idx: Option<usize>| match idx.and_then(|i| lyrics.lines.get(i)) {
        Some(line) => format!("{:?}", line.text),
        None => "-".to_string(),
    };

    match entry {
        Entry::Render {
            time_ms,
            position_ms,
            command: RenderCommand::Transform(t),
        } => {
            let motion = if t.is_instant() {
                "snap".to_string()
            } else {
                format!("{}ms {}", t.duration_ms, t.easing.css())
            };
            format!(
                "[{:>7} ms] pos {:>7}  transform {:>8.1}px  {}",
                time_ms, position_ms, t.offset_px, motion
            )
        }
        Entry::Render {
            time_ms,
            position_ms,
            command: RenderCommand::Highlight(h),
        } => format!(
            "[{:>7} ms] pos {:>7}  highlight {} -> {}",
            time_ms,
            position_ms,
            text(h.previous),
            text(h.current)
        ),
        Entry::Sample {
            time_ms,
            offset_px,
            highlighted,
        } => format!(
            "[{:>7} ms]              offset    {:>8.1}px  on {}",
            time_ms,
            offset_px,
            text(*highlighted)
        ),
    }
}
