//! Time calculation utilities for transform animations
//!
//! All times are milliseconds on the caller's clock, so a frame loop can be
//! driven by wall time or by a virtual clock.

/// Calculate animation progress (0.0 to 1.0)
///
/// # Arguments
/// * `start_ms` - Animation start time
/// * `duration_ms` - Total animation duration
/// * `now_ms` - Current time; earlier than `start_ms` reads as 0 progress
#[inline]
pub fn progress(start_ms: u64, duration_ms: u64, now_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    let elapsed = now_ms.saturating_sub(start_ms);
    (elapsed as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Check if animation is complete
#[inline]
pub fn is_complete(start_ms: u64, duration_ms: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(start_ms) >= duration_ms
}

/// Linear interpolation between two values
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 100.0, 0.0) - 0.0).abs() < 0.001);
        assert!((lerp(0.0, 100.0, 0.5) - 50.0).abs() < 0.001);
        assert!((lerp(-90.0, -60.0, 1.0) + 60.0).abs() < 0.001);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(100, 200, 100), 0.0);
        assert_eq!(progress(100, 200, 200), 0.5);
        assert_eq!(progress(100, 200, 900), 1.0);
        // clock behind the start
        assert_eq!(progress(100, 200, 50), 0.0);
    }

    #[test]
    fn test_progress_zero_duration() {
        assert_eq!(progress(0, 0, 0), 1.0);
        assert!(is_complete(10, 0, 10));
    }

    #[test]
    fn test_is_complete() {
        assert!(!is_complete(0, 300, 299));
        assert!(is_complete(0, 300, 300));
    }
}
