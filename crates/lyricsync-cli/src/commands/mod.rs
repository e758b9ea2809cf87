pub mod config;
pub mod live;
pub mod presets;
pub mod simulate;
