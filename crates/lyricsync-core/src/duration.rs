//! Maps a scroll displacement to an animation duration and easing curve.
//!
//! `duration = clamp(base + k * |delta|, min, max)`: larger jumps animate for
//! longer, but the cap keeps a multi-line jump from reading as a full-screen flick.

use serde::{Deserialize, Serialize};

use crate::config::EasingType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationModel {
    pub easing: EasingType,
    /// Duration at zero displacement, before clamping
    pub base_ms: f64,
    /// Additional milliseconds per pixel of displacement
    pub k_ms_per_px: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DurationModel {
    fn default() -> Self {
        crate::config::ScrollPreset::default().model()
    }
}

impl DurationModel {
    pub const fn new(easing: EasingType, base_ms: f64, k_ms_per_px: f64, min_ms: u64, max_ms: u64) -> Self {
        Self {
            easing,
            base_ms,
            k_ms_per_px,
            min_ms,
            max_ms,
        }
    }

    /// Animation duration for a displacement of `delta_px` (sign ignored)
    pub fn duration_ms(&self, delta_px: f64) -> u64 {
        let delta = if delta_px.is_finite() { delta_px.abs() } else { 0.0 };
        let raw = self.base_ms + self.k_ms_per_px * delta;
        let (lo, hi) = (self.min_ms.min(self.max_ms), self.max_ms.max(self.min_ms));
        (raw.round().max(0.0) as u64).clamp(lo, hi)
    }

    #[inline]
    pub fn easing(&self) -> EasingType {
        self.easing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> DurationModel {
        DurationModel::new(EasingType::Cubic, 200.0, 1.0, 250, 600)
    }

    #[test]
    fn test_small_delta_clamped_to_min() {
        assert_eq!(model().duration_ms(10.0), 250);
    }

    #[test]
    fn test_linear_region() {
        assert_eq!(model().duration_ms(100.0), 300);
        assert_eq!(model().duration_ms(-100.0), 300);
    }

    #[test]
    fn test_large_delta_clamped_to_max() {
        assert_eq!(model().duration_ms(5000.0), 600);
    }

    #[test]
    fn test_longer_jumps_never_shorter() {
        let m = model();
        let mut prev = 0;
        for px in (0..1000).step_by(25) {
            let d = m.duration_ms(px as f64);
            assert!(d >= prev, "duration shrank at {px}px");
            prev = d;
        }
    }

    #[test]
    fn test_non_finite_delta() {
        assert_eq!(model().duration_ms(f64::NAN), 250);
        assert_eq!(model().duration_ms(f64::INFINITY), 250);
    }
}
