//! Frame timing helpers for the scroll configuration

use std::time::Duration;

pub use lyricsync_core::ScrollConfig;

/// Extension trait for ScrollConfig with render-loop utilities
pub trait ScrollConfigExt {
    /// Interval between draw-loop frames
    fn frame_interval(&self) -> Duration;

    /// Whether index changes may animate at all
    fn is_smooth(&self) -> bool;
}

impl ScrollConfigExt for ScrollConfig {
    #[inline]
    fn frame_interval(&self) -> Duration {
        if self.frame_interval_ms == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_millis(self.frame_interval_ms)
        }
    }

    #[inline]
    fn is_smooth(&self) -> bool {
        self.smooth_enabled && self.duration_model().max_ms > 0
    }
}
