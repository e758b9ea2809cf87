//! Single-writer scroll state machine.
//!
//! Every transform write goes through [`ScrollOrchestrator::dispatch`]. One
//! event produces at most one transform command, and the state returns to
//! `Idle` before `dispatch` returns, so two writers are never active at once.
//! Highlight changes are held back and applied on the next frame through
//! [`ScrollOrchestrator::flush_highlight`], after the transform they belong to.

use crate::config::ScrollConfig;
use crate::duration::DurationModel;
use crate::event::{LayoutReason, ScrollEvent};
use crate::observe::SyncObserver;
use crate::render::{HighlightChange, Layout, LineMeasurer, Measurement, RenderSink, TransformCommand};

/// Displacements smaller than this produce no transform write at all
pub const NO_MOTION_EPSILON_PX: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    AlignInstant,
    AlignAnimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Instant,
    Animated,
}

/// What the orchestrator last applied. Mutated only by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingCell {
    pub last_index: Option<usize>,
    pub last_position_ms: u64,
    pub last_transform_offset: f64,
}

impl TrackingCell {
    pub fn at_track_start(start_ms: u64) -> Self {
        Self {
            last_index: None,
            last_position_ms: start_ms,
            last_transform_offset: 0.0,
        }
    }
}

impl Default for TrackingCell {
    fn default() -> Self {
        Self::at_track_start(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No lyric lines loaded
    EmptyLyrics,
    /// Target line not laid out yet; a later event retries
    NotReady,
    /// Already aligned; nothing to write
    NoMotion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    Applied {
        transition: Transition,
        command: TransformCommand,
        /// Active line after the event
        index: Option<usize>,
    },
    Skipped(SkipReason),
}

impl DispatchOutcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }

    pub fn command(&self) -> Option<TransformCommand> {
        match self {
            DispatchOutcome::Applied { command, .. } => Some(*command),
            DispatchOutcome::Skipped(_) => None,
        }
    }
}

/// Line a position-bearing event wanted before it was dropped as not ready
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeferredTarget {
    index: Option<usize>,
    position_ms: u64,
}

pub struct ScrollOrchestrator {
    model: DurationModel,
    min_motion_px: f64,
    smooth_enabled: bool,
    line_count: usize,
    cell: TrackingCell,
    state: OrchestratorState,
    deferred: Option<DeferredTarget>,
    pending_highlight: Option<HighlightChange>,
    observer: Option<Box<dyn SyncObserver>>,
}

impl ScrollOrchestrator {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            model: config.duration_model(),
            min_motion_px: config.min_motion_px.max(0.0),
            smooth_enabled: config.smooth_enabled,
            line_count: 0,
            cell: TrackingCell::default(),
            state: OrchestratorState::Idle,
            deferred: None,
            pending_highlight: None,
            observer: None,
        }
    }

    /// Attach an observability sink
    pub fn with_observer(mut self, observer: Box<dyn SyncObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn SyncObserver>>) {
        self.observer = observer;
    }

    /// Apply new scroll settings; takes effect on the next event
    pub fn set_config(&mut self, config: &ScrollConfig) {
        self.model = config.duration_model();
        self.min_motion_px = config.min_motion_px.max(0.0);
        self.smooth_enabled = config.smooth_enabled;
    }

    /// Start over for a new lyric set of `line_count` lines.
    ///
    /// A highlight that was shown for the previous lyrics is cleared on the next frame.
    pub fn reset(&mut self, line_count: usize, start_ms: u64) {
        let shown = self.cell.last_index;
        self.line_count = line_count;
        self.cell = TrackingCell::at_track_start(start_ms);
        self.state = OrchestratorState::Idle;
        self.deferred = None;
        if shown.is_some() {
            self.schedule_highlight(None, shown);
        }
    }

    #[inline]
    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Copy of the tracking cell
    #[inline]
    pub fn tracking(&self) -> TrackingCell {
        self.cell
    }

    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.cell.last_index
    }

    /// Line the last dropped event was heading for, if no later event landed
    #[inline]
    pub fn deferred_index(&self) -> Option<Option<usize>> {
        self.deferred.map(|deferred| deferred.index)
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    #[inline]
    pub fn pending_highlight(&self) -> Option<HighlightChange> {
        self.pending_highlight
    }

    #[inline]
    pub fn duration_model(&self) -> &DurationModel {
        &self.model
    }

    /// Resolve one event into at most one transform write
    pub fn dispatch(
        &mut self,
        event: ScrollEvent,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> DispatchOutcome {
        debug_assert_eq!(self.state, OrchestratorState::Idle, "dispatch re-entered");

        let outcome = self.resolve(event, measurer, layout, sink);
        self.state = OrchestratorState::Idle;

        if let Some(observer) = &self.observer {
            observer.on_dispatch(&event, &outcome);
        }
        outcome
    }

    /// Deliver the highlight change held since the last transform write
    pub fn flush_highlight(&mut self, sink: &mut dyn RenderSink) -> Option<HighlightChange> {
        let change = self.pending_highlight.take()?;
        sink.on_highlight_change(change);
        Some(change)
    }

    fn resolve(
        &mut self,
        event: ScrollEvent,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> DispatchOutcome {
        if self.line_count == 0 {
            return DispatchOutcome::Skipped(SkipReason::EmptyLyrics);
        }

        let (active, position_ms) = match event {
            ScrollEvent::IndexChange { idx, position_ms } => (Some(idx), Some(position_ms)),
            ScrollEvent::Seek { idx, position_ms, .. } => (idx, Some(position_ms)),
            ScrollEvent::LayoutChange {
                reason: LayoutReason::EngineHandover { idx, position_ms },
            } => (idx, Some(position_ms)),
            // geometry moved, the active line did not; a dropped target is still owed
            ScrollEvent::LayoutChange {
                reason: LayoutReason::Font | LayoutReason::Window | LayoutReason::Lyrics,
            } => match self.deferred {
                Some(deferred) => (deferred.index, Some(deferred.position_ms)),
                None => (self.cell.last_index, None),
            },
        };
        let active = active.map(|idx| self.clamp_index(idx));
        // nothing active yet: keep the first line in place
        let anchor = active.unwrap_or(0);

        let center = match measurer.measure(anchor) {
            Measurement::Ready { center_offset_px } if center_offset_px.is_finite() => center_offset_px,
            _ => {
                tracing::trace!(kind = event.kind(), line = anchor, "Line not measured yet, dropping event");
                self.defer(active, position_ms);
                return DispatchOutcome::Skipped(SkipReason::NotReady);
            }
        };
        let midpoint = layout.container_midpoint_px();
        if !midpoint.is_finite() {
            self.defer(active, position_ms);
            return DispatchOutcome::Skipped(SkipReason::NotReady);
        }
        self.deferred = None;

        let target = center - midpoint;
        let delta = target - self.cell.last_transform_offset;

        let outcome = if delta.abs() < NO_MOTION_EPSILON_PX {
            DispatchOutcome::Skipped(SkipReason::NoMotion)
        } else {
            let transition = self.choose_transition(&event, delta);
            let command = match transition {
                Transition::Instant => {
                    self.state = OrchestratorState::AlignInstant;
                    TransformCommand::instant(target)
                }
                Transition::Animated => {
                    self.state = OrchestratorState::AlignAnimated;
                    TransformCommand::animated(target, self.model.duration_ms(delta), self.model.easing())
                }
            };
            sink.on_transform(command);
            DispatchOutcome::Applied {
                transition,
                command,
                index: active,
            }
        };

        if active != self.cell.last_index {
            self.schedule_highlight(active, self.cell.last_index);
        }

        self.cell.last_index = active;
        if let Some(position_ms) = position_ms {
            self.cell.last_position_ms = position_ms;
        }
        self.cell.last_transform_offset = target;

        outcome
    }

    fn choose_transition(&self, event: &ScrollEvent, delta: f64) -> Transition {
        match event {
            ScrollEvent::Seek { .. } | ScrollEvent::LayoutChange { .. } => Transition::Instant,
            ScrollEvent::IndexChange { .. } => {
                let initializing = self.cell.last_index.is_none();
                if initializing || !self.smooth_enabled || delta.abs() < self.min_motion_px {
                    Transition::Instant
                } else {
                    Transition::Animated
                }
            }
        }
    }

    fn defer(&mut self, index: Option<usize>, position_ms: Option<u64>) {
        if let Some(position_ms) = position_ms {
            self.deferred = Some(DeferredTarget { index, position_ms });
        }
    }

    fn clamp_index(&self, idx: usize) -> usize {
        let last = self.line_count.saturating_sub(1);
        if idx > last {
            tracing::warn!(idx, line_count = self.line_count, "Stale line index, clamping");
        }
        idx.min(last)
    }

    /// Queue a highlight change, folding it into one that has not been flushed yet
    fn schedule_highlight(&mut self, current: Option<usize>, previous: Option<usize>) {
        let previous = match self.pending_highlight {
            Some(pending) => pending.previous,
            None => previous,
        };
        self.pending_highlight = (current != previous).then_some(HighlightChange { current, previous });
    }
}
