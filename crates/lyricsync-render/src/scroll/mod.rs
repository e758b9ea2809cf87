//! Render-side scroll animation for the lyric view
//!
//! The sync engine decides where the lyric list should be and for how long
//! the move takes. This module turns those transform commands into a sampled
//! offset per frame, the way a compositor would animate a CSS transform.
//!
//! - `easing` - Easing curves mapping progress [0, 1] to [0, 1]
//! - `timing` - Progress and interpolation on a millisecond clock
//! - `config` - Frame timing helpers for `ScrollConfig`
//! - `animation` - `TransformAnimator`, the `RenderSink` that owns the offset
//!
//! # Usage
//!
//! ```ignore
//! use lyricsync_render::TransformAnimator;
//!
//! let mut animator = TransformAnimator::new();
//! sync.tick(&position, &geometry, &geometry, &mut animator);
//!
//! // every frame
//! let offset = animator.update(now_ms);
//! ```

pub mod config;
pub mod easing;
pub mod timing;

pub mod animation;

pub use animation::TransformAnimator;
pub use config::ScrollConfigExt;
pub use easing::EasingTypeExt;
