pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod duration;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod index;
pub mod lyrics;
pub mod observe;
pub mod orchestrator;
pub mod position;
pub mod render;
pub mod scheduler;

pub use classifier::{Classification, SeekClassifier};
pub use config::{AppConfig, EasingType, ScrollConfig, ScrollPreset, SyncConfig};
pub use dispatcher::EventDispatcher;
pub use duration::DurationModel;
pub use engine::LyricSync;
pub use error::{Error, Result};
pub use event::{LayoutReason, ScrollEvent};
pub use geometry::SharedGeometry;
pub use index::TimestampIndex;
pub use lyrics::{LyricLine, LyricsProvider, ParsedLyrics, StaticLyricsProvider};
pub use observe::{SyncObserver, TracingObserver};
pub use orchestrator::{
    DispatchOutcome, OrchestratorState, ScrollOrchestrator, SkipReason, TrackingCell, Transition,
};
pub use position::{DualEngineSource, EngineId, FixedPosition, PositionSample, PositionSource};
pub use render::{
    ChannelSink, HighlightChange, Layout, LineMeasurer, Measurement, RenderCommand, RenderSink,
    TransformCommand,
};
pub use scheduler::{
    ManualScheduler, Scheduler, SyncCommand, SyncHandle, SyncService, TickCallback, TickHandle,
    TokioFrameScheduler,
};
