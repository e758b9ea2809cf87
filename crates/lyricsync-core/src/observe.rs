//! Optional observability hook for the orchestrator. Never affects behavior.

use crate::event::ScrollEvent;
use crate::orchestrator::DispatchOutcome;

pub trait SyncObserver: Send {
    fn on_dispatch(&self, event: &ScrollEvent, outcome: &DispatchOutcome);
}

/// Emits every dispatch decision as a `tracing` debug event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_dispatch(&self, event: &ScrollEvent, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Applied { transition, command, index } => tracing::debug!(
                kind = event.kind(),
                ?transition,
                index = ?index,
                offset_px = command.offset_px,
                duration_ms = command.duration_ms,
                "Scroll transform issued"
            ),
            DispatchOutcome::Skipped(reason) => tracing::trace!(
                kind = event.kind(),
                ?reason,
                "Scroll event skipped"
            ),
        }
    }
}
