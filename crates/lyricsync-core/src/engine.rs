//! One-track lyric sync engine: index, classifier, dispatcher and orchestrator wired together.

use std::sync::Arc;

use crate::classifier::SeekClassifier;
use crate::config::{AppConfig, ScrollConfig, SyncConfig};
use crate::dispatcher::EventDispatcher;
use crate::event::{LayoutReason, ScrollEvent};
use crate::index::TimestampIndex;
use crate::lyrics::{LyricLine, ParsedLyrics};
use crate::observe::SyncObserver;
use crate::orchestrator::{DispatchOutcome, ScrollOrchestrator, SkipReason, TrackingCell};
use crate::position::{PositionSample, PositionSource};
use crate::render::{HighlightChange, Layout, LineMeasurer, RenderSink};

/// Drives lyric highlighting and scrolling from the playback position.
///
/// Call [`tick`](Self::tick) once per frame. A highlight change produced by
/// one tick is delivered at the start of the next, after its transform.
pub struct LyricSync {
    sync_config: SyncConfig,
    lyrics: Arc<ParsedLyrics>,
    index: TimestampIndex,
    classifier: SeekClassifier,
    dispatcher: EventDispatcher,
    orchestrator: ScrollOrchestrator,
}

impl LyricSync {
    pub fn new(config: &AppConfig) -> Self {
        let index = TimestampIndex::default();
        Self {
            classifier: SeekClassifier::new(&index, &config.sync),
            sync_config: config.sync.clone(),
            lyrics: Arc::new(ParsedLyrics::default()),
            index,
            dispatcher: EventDispatcher::new(),
            orchestrator: ScrollOrchestrator::new(&config.scroll),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn SyncObserver>) -> Self {
        self.orchestrator.set_observer(Some(observer));
        self
    }

    /// Replace the lyrics for a new track and reset all tracking state
    pub fn load_lyrics(&mut self, lyrics: Arc<ParsedLyrics>, start_ms: u64) {
        self.index = TimestampIndex::new(&lyrics);
        self.classifier = SeekClassifier::new(&self.index, &self.sync_config);
        self.dispatcher.reset(start_ms);
        self.orchestrator.reset(self.index.len(), start_ms);
        tracing::debug!(lines = lyrics.len(), start_ms, "Lyrics loaded");
        self.lyrics = lyrics;
    }

    /// Drop the current lyrics; every later call is a no-op until new lyrics load
    pub fn clear_lyrics(&mut self) {
        self.load_lyrics(Arc::new(ParsedLyrics::default()), 0);
    }

    pub fn set_scroll_config(&mut self, config: &ScrollConfig) {
        self.orchestrator.set_config(config);
    }

    /// One draw-loop frame: deliver the pending highlight, then read and dispatch the position
    pub fn tick(
        &mut self,
        source: &dyn PositionSource,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> Option<DispatchOutcome> {
        self.orchestrator.flush_highlight(sink);
        self.on_sample(source.sample(), measurer, layout, sink)
    }

    /// Dispatch one position reading without a frame boundary
    pub fn on_sample(
        &mut self,
        sample: PositionSample,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> Option<DispatchOutcome> {
        let event = self.dispatcher.on_position(
            sample,
            &self.index,
            &self.classifier,
            self.orchestrator.last_index(),
        )?;
        let outcome = self.orchestrator.dispatch(event, measurer, layout, sink);
        if outcome == DispatchOutcome::Skipped(SkipReason::NotReady) {
            self.dispatcher.defer(&event);
        }
        Some(outcome)
    }

    /// Font size, window size or lyric layout changed
    pub fn layout_changed(
        &mut self,
        reason: LayoutReason,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> DispatchOutcome {
        let event = self.dispatcher.on_layout(reason);
        let outcome = self.orchestrator.dispatch(event, measurer, layout, sink);
        if outcome != DispatchOutcome::Skipped(SkipReason::NotReady) {
            // whatever was dropped earlier has been realigned here
            self.dispatcher.clear_deferred();
        }
        outcome
    }

    /// Dispatch an already classified event
    pub fn dispatch(
        &mut self,
        event: ScrollEvent,
        measurer: &dyn LineMeasurer,
        layout: &dyn Layout,
        sink: &mut dyn RenderSink,
    ) -> DispatchOutcome {
        self.orchestrator.dispatch(event, measurer, layout, sink)
    }

    pub fn flush_highlight(&mut self, sink: &mut dyn RenderSink) -> Option<HighlightChange> {
        self.orchestrator.flush_highlight(sink)
    }

    /// The position engine is about to change; resynchronize on the next reading
    pub fn notify_engine_handover(&mut self) {
        self.dispatcher.notify_handover();
    }

    pub fn lyrics(&self) -> &Arc<ParsedLyrics> {
        &self.lyrics
    }

    pub fn index(&self) -> &TimestampIndex {
        &self.index
    }

    pub fn classifier(&self) -> &SeekClassifier {
        &self.classifier
    }

    #[inline]
    pub fn active_index(&self) -> Option<usize> {
        self.orchestrator.last_index()
    }

    pub fn active_line(&self) -> Option<&LyricLine> {
        self.active_index().and_then(|idx| self.lyrics.lines.get(idx))
    }

    #[inline]
    pub fn tracking(&self) -> TrackingCell {
        self.orchestrator.tracking()
    }
}
