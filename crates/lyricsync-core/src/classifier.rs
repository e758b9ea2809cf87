//! Seek detection from the position signal alone.
//!
//! A fixed time threshold misreads fast songs as constant seeking and slow
//! songs as never seeking, so the time threshold scales with the song's own
//! line cadence.

use crate::config::SyncConfig;
use crate::index::TimestampIndex;

/// How a position change relates to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No previous index: first assignment after a track load
    Initial,
    /// Ordinary forward playback
    Advance,
    /// Discontinuous jump
    Seek,
}

#[derive(Debug, Clone)]
pub struct SeekClassifier {
    index_span_threshold: usize,
    time_threshold_ms: f64,
    avg_interval_ms: f64,
}

impl SeekClassifier {
    pub fn new(index: &TimestampIndex, config: &SyncConfig) -> Self {
        let avg_interval_ms = index
            .average_interval_ms(config.outlier_gap_ms)
            .unwrap_or(config.fallback_interval_ms as f64);

        let lo = config.min_time_threshold_ms as f64;
        let hi = (config.max_time_threshold_ms as f64).max(lo);
        let time_threshold_ms = (avg_interval_ms * config.time_multiplier).clamp(lo, hi);

        tracing::debug!(
            avg_interval_ms,
            time_threshold_ms,
            index_span = config.index_span_threshold,
            "Seek classifier calibrated"
        );

        Self {
            index_span_threshold: config.index_span_threshold.max(1),
            time_threshold_ms,
            avg_interval_ms,
        }
    }

    #[inline]
    pub fn avg_interval_ms(&self) -> f64 {
        self.avg_interval_ms
    }

    /// Dynamic time threshold; a jump must exceed it to count as a seek
    #[inline]
    pub fn time_threshold_ms(&self) -> f64 {
        self.time_threshold_ms
    }

    #[inline]
    pub fn index_span_threshold(&self) -> usize {
        self.index_span_threshold
    }

    pub fn classify(
        &self,
        prev_index: Option<usize>,
        new_index: Option<usize>,
        prev_time_ms: u64,
        new_time_ms: u64,
    ) -> Classification {
        let Some(prev) = prev_index else {
            return Classification::Initial;
        };

        let index_delta = index_delta(Some(prev), new_index);
        let time_delta = prev_time_ms.abs_diff(new_time_ms) as f64;

        if index_delta >= self.index_span_threshold || time_delta > self.time_threshold_ms {
            Classification::Seek
        } else {
            Classification::Advance
        }
    }

    pub fn is_seek(
        &self,
        prev_index: Option<usize>,
        new_index: Option<usize>,
        prev_time_ms: u64,
        new_time_ms: u64,
    ) -> bool {
        self.classify(prev_index, new_index, prev_time_ms, new_time_ms) == Classification::Seek
    }
}

/// Line distance between two indices, counting "before the first line" as -1
pub fn index_delta(a: Option<usize>, b: Option<usize>) -> usize {
    let as_signed = |i: Option<usize>| i.map_or(-1, |i| i as i64);
    as_signed(a).abs_diff(as_signed(b)) as usize
}
