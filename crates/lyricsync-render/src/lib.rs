pub mod scroll;

pub use scroll::{EasingTypeExt, ScrollConfigExt, TransformAnimator};
