//! Turns raw position readings and layout signals into [`ScrollEvent`]s.
//!
//! The dispatcher keeps its own reference clock, advanced on every tick, so
//! the time delta it classifies is always frame-to-frame. When the engine that
//! owns the position changes, the clock is resynchronized to the new engine's
//! first reading before anything is classified, and the handover surfaces as
//! an instant realignment instead of a seek.

use crate::classifier::{index_delta, Classification, SeekClassifier};
use crate::event::{LayoutReason, ScrollEvent};
use crate::index::TimestampIndex;
use crate::position::{EngineId, PositionSample};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReferenceClock {
    position_ms: u64,
    engine: EngineId,
}

/// An event the orchestrator dropped; the next reading raises it again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Handover,
    Seek { from_ms: u64 },
}

#[derive(Debug, Default)]
pub struct EventDispatcher {
    clock: Option<ReferenceClock>,
    /// Compared against the first reading of a track
    origin_ms: u64,
    handover_pending: bool,
    deferred: Option<Deferred>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the reference clock (track change)
    pub fn reset(&mut self, start_ms: u64) {
        self.clock = None;
        self.origin_ms = start_ms;
        self.handover_pending = false;
        self.deferred = None;
    }

    /// Explicit handover notification; the next reading resynchronizes the clock
    pub fn notify_handover(&mut self) {
        self.handover_pending = true;
    }

    /// Keep a handover or seek alive after the orchestrator could not apply it.
    ///
    /// The clock has already moved on, so without this the next reading would
    /// be classified against stale tracking state.
    pub fn defer(&mut self, event: &ScrollEvent) {
        match *event {
            ScrollEvent::LayoutChange {
                reason: LayoutReason::EngineHandover { .. },
            } => self.deferred = Some(Deferred::Handover),
            ScrollEvent::Seek {
                position_ms, delta_ms, ..
            } => {
                let from_ms = (position_ms as i64 - delta_ms).max(0) as u64;
                self.deferred = Some(Deferred::Seek { from_ms });
            }
            ScrollEvent::IndexChange { .. } | ScrollEvent::LayoutChange { .. } => {}
        }
    }

    /// A layout realignment already applied the dropped target
    pub fn clear_deferred(&mut self) {
        self.deferred = None;
    }

    #[inline]
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Position the next reading is compared against
    pub fn reference_position_ms(&self) -> Option<u64> {
        self.clock.map(|clock| clock.position_ms)
    }

    pub fn reference_engine(&self) -> Option<EngineId> {
        self.clock.map(|clock| clock.engine)
    }

    /// Classify one position reading against the last applied line.
    /// Returns `None` when nothing needs to move.
    pub fn on_position(
        &mut self,
        sample: PositionSample,
        index: &TimestampIndex,
        classifier: &SeekClassifier,
        last_index: Option<usize>,
    ) -> Option<ScrollEvent> {
        let position_ms = sample.sanitized_ms();
        let previous = self.clock.replace(ReferenceClock {
            position_ms,
            engine: sample.engine,
        });
        let deferred = self.deferred.take();
        let handover = std::mem::take(&mut self.handover_pending)
            || deferred == Some(Deferred::Handover)
            || previous.is_some_and(|clock| clock.engine != sample.engine);

        if index.is_empty() {
            return None;
        }
        let idx = index.locate(position_ms);

        if handover {
            tracing::debug!(
                engine = %sample.engine,
                position_ms,
                previous_ms = previous.map(|clock| clock.position_ms),
                "Engine handover, reference clock resynchronized"
            );
            return Some(ScrollEvent::layout(LayoutReason::EngineHandover { idx, position_ms }));
        }

        let prev_time = previous.map_or(self.origin_ms, |clock| clock.position_ms);

        if let Some(Deferred::Seek { from_ms }) = deferred {
            tracing::trace!(from_ms, position_ms, "Retrying dropped seek");
            return Some(ScrollEvent::Seek {
                idx,
                position_ms,
                delta_ms: position_ms as i64 - from_ms as i64,
                index_delta: index_delta(last_index, idx),
            });
        }

        match classifier.classify(last_index, idx, prev_time, position_ms) {
            Classification::Initial => idx.map(|idx| ScrollEvent::index_change(idx, position_ms)),
            Classification::Seek => {
                let event = ScrollEvent::Seek {
                    idx,
                    position_ms,
                    delta_ms: position_ms as i64 - prev_time as i64,
                    index_delta: index_delta(last_index, idx),
                };
                tracing::debug!(?event, "Seek detected");
                Some(event)
            }
            Classification::Advance => match idx {
                Some(idx) if Some(idx) != last_index => Some(ScrollEvent::index_change(idx, position_ms)),
                Some(_) => None,
                // stepped back before the first line
                None => Some(ScrollEvent::Seek {
                    idx: None,
                    position_ms,
                    delta_ms: position_ms as i64 - prev_time as i64,
                    index_delta: index_delta(last_index, None),
                }),
            },
        }
    }

    pub fn on_layout(&mut self, reason: LayoutReason) -> ScrollEvent {
        ScrollEvent::layout(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::orchestrator::TrackingCell;

    struct Fixture {
        index: TimestampIndex,
        classifier: SeekClassifier,
        dispatcher: EventDispatcher,
        tracking: TrackingCell,
    }

    impl Fixture {
        fn uniform(count: u64, spacing: u64) -> Self {
            let index = TimestampIndex::from_timestamps((0..count).map(|i| i * spacing).collect());
            let classifier = SeekClassifier::new(&index, &SyncConfig::default());
            Self {
                index,
                classifier,
                dispatcher: EventDispatcher::new(),
                tracking: TrackingCell::default(),
            }
        }

        /// Feed a reading and pretend the orchestrator applied whatever came out
        fn feed(&mut self, position_ms: f64, engine: EngineId) -> Option<ScrollEvent> {
            let event = self.dispatcher.on_position(
                PositionSample::new(position_ms, engine),
                &self.index,
                &self.classifier,
                self.tracking.last_index,
            );
            match event {
                Some(ScrollEvent::IndexChange { idx, position_ms }) => {
                    self.tracking.last_index = Some(idx);
                    self.tracking.last_position_ms = position_ms;
                }
                Some(ScrollEvent::Seek { idx, position_ms, .. })
                | Some(ScrollEvent::LayoutChange {
                    reason: LayoutReason::EngineHandover { idx, position_ms },
                }) => {
                    self.tracking.last_index = idx;
                    self.tracking.last_position_ms = position_ms;
                }
                _ => {}
            }
            event
        }

        /// Feed a reading the orchestrator could not apply
        fn feed_dropped(&mut self, position_ms: f64, engine: EngineId) -> Option<ScrollEvent> {
            let event = self.dispatcher.on_position(
                PositionSample::new(position_ms, engine),
                &self.index,
                &self.classifier,
                self.tracking.last_index,
            )?;
            self.dispatcher.defer(&event);
            Some(event)
        }

        fn play(&mut self, from_ms: u64, to_ms: u64) -> Vec<ScrollEvent> {
            (from_ms..=to_ms)
                .step_by(16)
                .filter_map(|t| self.feed(t as f64, EngineId::Native))
                .collect()
        }
    }

    #[test]
    fn test_first_reading_initializes() {
        let mut f = Fixture::uniform(4, 3000);
        assert_eq!(f.feed(3500.0, EngineId::Native), Some(ScrollEvent::index_change(1, 3500)));
    }

    #[test]
    fn test_before_first_line_emits_nothing() {
        let mut f = Fixture {
            index: TimestampIndex::from_timestamps(vec![2000, 5000]),
            ..Fixture::uniform(2, 3000)
        };
        assert_eq!(f.feed(500.0, EngineId::Native), None);
        assert_eq!(f.feed(516.0, EngineId::Native), None);
        assert_eq!(f.feed(2000.0, EngineId::Native), Some(ScrollEvent::index_change(0, 2000)));
    }

    #[test]
    fn test_normal_playback_emits_one_event_per_line() {
        let mut f = Fixture::uniform(10, 3000);
        let events = f.play(0, 27_010);
        assert_eq!(events.len(), 10);
        for (i, event) in events.iter().enumerate() {
            assert!(
                matches!(event, ScrollEvent::IndexChange { idx, .. } if *idx == i),
                "unexpected {event:?}"
            );
        }
    }

    #[test]
    fn test_long_line_is_not_a_seek() {
        // 3s cadence except one 20s line; per-tick deltas keep it ordinary playback
        let mut f = Fixture {
            index: TimestampIndex::from_timestamps(vec![0, 3000, 6000, 26_000, 29_000]),
            ..Fixture::uniform(1, 1)
        };
        f.classifier = SeekClassifier::new(&f.index, &SyncConfig::default());
        let events = f.play(0, 29_010);
        assert!(events.iter().all(|e| matches!(e, ScrollEvent::IndexChange { .. })));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_large_jump_is_seek() {
        let mut f = Fixture::uniform(4, 3000);
        f.feed(500.0, EngineId::Native);
        assert_eq!(
            f.feed(9200.0, EngineId::Native),
            Some(ScrollEvent::Seek {
                idx: Some(3),
                position_ms: 9200,
                delta_ms: 8700,
                index_delta: 3
            })
        );
    }

    #[test]
    fn test_jump_within_line_is_seek_on_same_index() {
        let mut f = Fixture {
            index: TimestampIndex::from_timestamps(vec![0, 3000, 60_000]),
            ..Fixture::uniform(1, 1)
        };
        f.classifier = SeekClassifier::new(&f.index, &SyncConfig::default());
        f.feed(3100.0, EngineId::Native);
        let event = f.feed(40_000.0, EngineId::Native);
        assert!(matches!(event, Some(ScrollEvent::Seek { idx: Some(1), index_delta: 0, .. })));
    }

    #[test]
    fn test_seek_back_before_first_line() {
        let mut f = Fixture {
            index: TimestampIndex::from_timestamps(vec![1000, 4000, 7000]),
            ..Fixture::uniform(1, 1)
        };
        f.classifier = SeekClassifier::new(&f.index, &SyncConfig::default());
        f.feed(1200.0, EngineId::Native);
        let event = f.feed(900.0, EngineId::Native);
        assert!(matches!(event, Some(ScrollEvent::Seek { idx: None, delta_ms: -300, .. })));
    }

    #[test]
    fn test_handover_resyncs_before_classifying() {
        let mut f = Fixture::uniform(10, 3000);
        f.feed(1000.0, EngineId::Native);
        let event = f.feed(6000.0, EngineId::InProcess);
        assert_eq!(
            event,
            Some(ScrollEvent::layout(LayoutReason::EngineHandover {
                idx: Some(2),
                position_ms: 6000
            }))
        );
        assert_eq!(f.dispatcher.reference_position_ms(), Some(6000));
        assert_eq!(f.dispatcher.reference_engine(), Some(EngineId::InProcess));
        // the new engine keeps playing normally afterwards
        assert_eq!(f.feed(6016.0, EngineId::InProcess), None);
    }

    #[test]
    fn test_explicit_handover_notification() {
        let mut f = Fixture::uniform(10, 3000);
        f.feed(1000.0, EngineId::Native);
        f.dispatcher.notify_handover();
        let event = f.feed(20_000.0, EngineId::Native);
        assert!(matches!(
            event,
            Some(ScrollEvent::LayoutChange { reason: LayoutReason::EngineHandover { .. } })
        ));
        assert_eq!(f.feed(20_016.0, EngineId::Native), None);
    }

    #[test]
    fn test_malformed_positions_read_as_zero() {
        let mut f = Fixture::uniform(4, 3000);
        assert_eq!(f.feed(f64::NAN, EngineId::Native), Some(ScrollEvent::index_change(0, 0)));
        assert_eq!(f.feed(-250.0, EngineId::Native), None);
        assert_eq!(f.dispatcher.reference_position_ms(), Some(0));
    }

    #[test]
    fn test_empty_index_emits_nothing() {
        let mut f = Fixture {
            index: TimestampIndex::default(),
            ..Fixture::uniform(1, 1)
        };
        assert_eq!(f.feed(1000.0, EngineId::Native), None);
        assert_eq!(f.feed(1000.0, EngineId::InProcess), None);
    }

    #[test]
    fn test_reset_forgets_clock() {
        let mut f = Fixture::uniform(4, 3000);
        f.feed(1000.0, EngineId::Native);
        f.dispatcher.notify_handover();
        f.dispatcher.reset(0);
        assert_eq!(f.dispatcher.reference_position_ms(), None);
        f.tracking = TrackingCell::default();
        assert_eq!(f.feed(1000.0, EngineId::InProcess), Some(ScrollEvent::index_change(0, 1000)));
    }

    #[test]
    fn test_dropped_handover_is_raised_again() {
        let mut f = Fixture::uniform(10, 3000);
        f.feed(3100.0, EngineId::Native);
        let dropped = f.feed_dropped(18_000.0, EngineId::InProcess);
        assert!(matches!(
            dropped,
            Some(ScrollEvent::LayoutChange { reason: LayoutReason::EngineHandover { idx: Some(6), .. } })
        ));

        // same engine now, yet still a handover and not a six-line seek
        assert_eq!(
            f.feed(18_016.0, EngineId::InProcess),
            Some(ScrollEvent::layout(LayoutReason::EngineHandover {
                idx: Some(6),
                position_ms: 18_016
            }))
        );
        assert_eq!(f.feed(18_032.0, EngineId::InProcess), None);
    }

    #[test]
    fn test_dropped_seek_keeps_its_origin() {
        let mut f = Fixture {
            index: TimestampIndex::from_timestamps(vec![0, 3000, 60_000]),
            ..Fixture::uniform(1, 1)
        };
        f.classifier = SeekClassifier::new(&f.index, &SyncConfig::default());
        f.feed(3100.0, EngineId::Native);
        assert!(matches!(f.feed_dropped(40_000.0, EngineId::Native), Some(ScrollEvent::Seek { .. })));
        // dropped twice; a 16ms step on the same line would otherwise be nothing
        assert!(matches!(f.feed_dropped(40_016.0, EngineId::Native), Some(ScrollEvent::Seek { .. })));
        assert_eq!(
            f.feed(40_032.0, EngineId::Native),
            Some(ScrollEvent::Seek {
                idx: Some(1),
                position_ms: 40_032,
                delta_ms: 36_932,
                index_delta: 0
            })
        );
        assert!(!f.dispatcher.has_deferred());
        assert_eq!(f.feed(40_048.0, EngineId::Native), None);
    }

    #[test]
    fn test_cleared_deferral_classifies_normally() {
        let mut f = Fixture::uniform(10, 3000);
        f.feed(3100.0, EngineId::Native);
        f.feed_dropped(18_000.0, EngineId::InProcess);
        assert!(f.dispatcher.has_deferred());

        // a layout realignment landed on line 6 in the meantime
        f.dispatcher.clear_deferred();
        f.tracking.last_index = Some(6);
        assert_eq!(f.feed(18_016.0, EngineId::InProcess), None);
    }
}
