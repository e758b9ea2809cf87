mod frame;
mod service;

pub use frame::{ManualScheduler, Scheduler, TickCallback, TickHandle, TokioFrameScheduler};
pub use service::{SyncCommand, SyncHandle, SyncService};
