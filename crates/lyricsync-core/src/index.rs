//! Active-line lookup over the ascending line start times.

use crate::lyrics::ParsedLyrics;

/// Sorted line start times for one lyric set.
///
/// Built once per lyric set in O(n); every lookup after that is O(log n).
#[derive(Debug, Clone, Default)]
pub struct TimestampIndex {
    timestamps: Vec<u64>,
}

impl TimestampIndex {
    pub fn new(lyrics: &ParsedLyrics) -> Self {
        Self::from_timestamps(lyrics.timestamps().collect())
    }

    /// Build from raw timestamps. They must already be non-decreasing.
    pub fn from_timestamps(timestamps: Vec<u64>) -> Self {
        debug_assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        Self { timestamps }
    }

    /// Index of the greatest line whose timestamp is `<= position_ms`,
    /// or `None` when the position precedes the first line.
    pub fn locate(&self, position_ms: u64) -> Option<usize> {
        self.timestamps
            .partition_point(|&t| t <= position_ms)
            .checked_sub(1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Mean of the positive inter-line gaps shorter than `outlier_gap_ms`.
    ///
    /// Returns `None` when there are fewer than two lines or no gap qualifies.
    pub fn average_interval_ms(&self, outlier_gap_ms: u64) -> Option<f64> {
        let (sum, count) = self
            .timestamps
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&gap| gap > 0 && gap < outlier_gap_ms)
            .fold((0u64, 0u64), |(sum, count), gap| (sum + gap, count + 1));

        (count > 0).then(|| sum as f64 / count as f64)
    }
}
