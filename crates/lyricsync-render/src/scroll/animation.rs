//! Transform animation controller
//!
//! Receives transform commands from the sync engine and samples the eased
//! list offset each frame. A new command always supersedes the one in flight:
//! an animated command restarts from wherever the list currently is, and an
//! instant command snaps, so two transitions are never blended.

use lyricsync_core::{HighlightChange, RenderSink, TransformCommand};

use super::easing::{EasingType, EasingTypeExt};
use super::timing::{is_complete, lerp, progress};

/// Active transform animation state
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveAnimation {
    start_ms: u64,
    from: f64,
    to: f64,
    duration_ms: u64,
    easing: EasingType,
}

impl ActiveAnimation {
    fn sample(&self, now_ms: u64) -> f64 {
        let t = progress(self.start_ms, self.duration_ms, now_ms);
        lerp(self.from, self.to, self.easing.apply(t))
    }
}

/// Render sink that owns the lyric list's vertical offset.
///
/// Call `update()` every frame with the current time to advance the
/// animation. Commands received between frames start at the last time seen.
#[derive(Debug, Clone, Default)]
pub struct TransformAnimator {
    animation: Option<ActiveAnimation>,
    current_offset: f64,
    now_ms: u64,
    highlighted: Option<usize>,
    interrupted: usize,
}

impl TransformAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `now_ms` instead of 0
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Offset the list is heading to
    pub fn target_offset(&self) -> f64 {
        self.animation.map_or(self.current_offset, |a| a.to)
    }

    /// Offset sampled on the last update
    #[inline]
    pub fn current_offset(&self) -> f64 {
        self.current_offset
    }

    #[inline]
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Animations cut short by a newer command
    #[inline]
    pub fn interrupted(&self) -> usize {
        self.interrupted
    }

    /// Advance to `now_ms` and return the current offset
    pub fn update(&mut self, now_ms: u64) -> f64 {
        self.now_ms = self.now_ms.max(now_ms);

        if let Some(anim) = self.animation {
            if is_complete(anim.start_ms, anim.duration_ms, self.now_ms) {
                self.current_offset = anim.to;
                self.animation = None;
            } else {
                self.current_offset = anim.sample(self.now_ms);
            }
        }

        self.current_offset
    }

    /// Stop where the list currently is
    pub fn cancel(&mut self) {
        if let Some(anim) = self.animation.take() {
            self.current_offset = anim.sample(self.now_ms);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::starting_at(self.now_ms);
    }

    fn apply(&mut self, command: TransformCommand) {
        if self.animation.is_some() {
            self.interrupted += 1;
        }
        // retarget from the visible position, not the old target
        self.cancel();

        if command.is_instant() || command.easing == EasingType::None {
            self.current_offset = command.offset_px;
            return;
        }
        if (command.offset_px - self.current_offset).abs() < f64::EPSILON {
            return;
        }

        self.animation = Some(ActiveAnimation {
            start_ms: self.now_ms,
            from: self.current_offset,
            to: command.offset_px,
            duration_ms: command.duration_ms,
            easing: command.easing,
        });
    }
}

impl RenderSink for TransformAnimator {
    fn on_transform(&mut self, command: TransformCommand) {
        tracing::trace!(
            offset_px = command.offset_px,
            duration_ms = command.duration_ms,
            from_px = self.current_offset,
            "Transform received"
        );
        self.apply(command);
    }

    fn on_highlight_change(&mut self, change: HighlightChange) {
        self.highlighted = change.current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_command_snaps() {
        let mut animator = TransformAnimator::new();
        animator.on_transform(TransformCommand::instant(-90.0));
        assert!(!animator.is_animating());
        assert_eq!(animator.update(0), -90.0);
    }

    #[test]
    fn test_animation_reaches_target() {
        let mut animator = TransformAnimator::new();
        animator.on_transform(TransformCommand::instant(-90.0));
        animator.on_transform(TransformCommand::animated(-60.0, 300, EasingType::Linear));
        assert!(animator.is_animating());
        assert_eq!(animator.target_offset(), -60.0);

        assert!((animator.update(150) + 75.0).abs() < 1e-9);
        assert_eq!(animator.update(300), -60.0);
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_interruption_retargets_from_visible_offset() {
        let mut animator = TransformAnimator::new();
        animator.on_transform(TransformCommand::animated(100.0, 200, EasingType::Linear));
        animator.update(100);
        assert!((animator.current_offset() - 50.0).abs() < 1e-9);

        animator.on_transform(TransformCommand::animated(0.0, 200, EasingType::Linear));
        assert_eq!(animator.interrupted(), 1);
        // no jump at the moment of retargeting
        assert!((animator.update(100) - 50.0).abs() < 1e-9);
        assert!((animator.update(200) - 25.0).abs() < 1e-9);
        assert_eq!(animator.update(300), 0.0);
    }

    #[test]
    fn test_instant_cancels_animation() {
        let mut animator = TransformAnimator::new();
        animator.on_transform(TransformCommand::animated(100.0, 500, EasingType::Cubic));
        animator.update(50);
        animator.on_transform(TransformCommand::instant(-30.0));
        assert!(!animator.is_animating());
        assert_eq!(animator.update(60), -30.0);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut animator = TransformAnimator::starting_at(1000);
        animator.on_transform(TransformCommand::animated(10.0, 100, EasingType::Linear));
        assert_eq!(animator.update(500), 0.0);
        assert_eq!(animator.update(1100), 10.0);
    }

    #[test]
    fn test_highlight_tracks_current_line() {
        let mut animator = TransformAnimator::new();
        animator.on_highlight_change(HighlightChange { current: Some(2), previous: None });
        assert_eq!(animator.highlighted(), Some(2));
        animator.on_highlight_change(HighlightChange { current: None, previous: Some(2) });
        assert_eq!(animator.highlighted(), None);
    }
}
