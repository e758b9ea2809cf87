//! Boundary with the measurement and rendering collaborators.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::EasingType;

/// Result of measuring one line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Center of the line, in list coordinates (independent of the applied transform)
    Ready { center_offset_px: f64 },
    /// Line not laid out yet
    NotReady,
}

pub trait LineMeasurer {
    fn measure(&self, index: usize) -> Measurement;
}

pub trait Layout {
    fn container_midpoint_px(&self) -> f64;
}

/// A single scroll write. `duration_ms == 0` means apply instantly with no transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformCommand {
    /// Distance of the target line's center from the container midpoint
    pub offset_px: f64,
    pub duration_ms: u64,
    pub easing: EasingType,
}

impl TransformCommand {
    pub fn instant(offset_px: f64) -> Self {
        Self {
            offset_px,
            duration_ms: 0,
            easing: EasingType::None,
        }
    }

    pub fn animated(offset_px: f64, duration_ms: u64, easing: EasingType) -> Self {
        Self {
            offset_px,
            duration_ms,
            easing,
        }
    }

    #[inline]
    pub fn is_instant(&self) -> bool {
        self.duration_ms == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightChange {
    pub current: Option<usize>,
    pub previous: Option<usize>,
}

pub trait RenderSink {
    fn on_transform(&mut self, command: TransformCommand);
    fn on_highlight_change(&mut self, change: HighlightChange);
}

/// Everything the engine tells the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderCommand {
    Transform(TransformCommand),
    Highlight(HighlightChange),
}

impl RenderSink for Vec<RenderCommand> {
    fn on_transform(&mut self, command: TransformCommand) {
        self.push(RenderCommand::Transform(command));
    }

    fn on_highlight_change(&mut self, change: HighlightChange) {
        self.push(RenderCommand::Highlight(change));
    }
}

/// Forwards render commands over a channel to whichever thread draws
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RenderCommand>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<RenderCommand>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RenderCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: RenderCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Failed to send render command: receiver dropped");
        }
    }
}

impl RenderSink for ChannelSink {
    fn on_transform(&mut self, command: TransformCommand) {
        self.send(RenderCommand::Transform(command));
    }

    fn on_highlight_change(&mut self, change: HighlightChange) {
        self.send(RenderCommand::Highlight(change));
    }
}
