use serde::{Deserialize, Serialize};

/// Input to the scroll orchestrator. Every variant must be handled explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollEvent {
    /// Ordinary playback advance crossed a line boundary
    IndexChange { idx: usize, position_ms: u64 },
    /// Discontinuous jump: user seek, restart, or a jump the classifier flagged
    Seek {
        /// `None` when the new position precedes the first line
        idx: Option<usize>,
        position_ms: u64,
        delta_ms: i64,
        index_delta: usize,
    },
    /// Line geometry may have moved; realign without animating
    LayoutChange { reason: LayoutReason },
}

/// Why a realignment was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LayoutReason {
    Font,
    Window,
    /// Lyrics finished laying out
    Lyrics,
    /// Another playback engine took over the position signal. Carries the
    /// position the reference clock was resynchronized to.
    EngineHandover { idx: Option<usize>, position_ms: u64 },
}

impl ScrollEvent {
    pub fn index_change(idx: usize, position_ms: u64) -> Self {
        ScrollEvent::IndexChange { idx, position_ms }
    }

    pub fn layout(reason: LayoutReason) -> Self {
        ScrollEvent::LayoutChange { reason }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ScrollEvent::IndexChange { .. } => "index_change",
            ScrollEvent::Seek { .. } => "seek",
            ScrollEvent::LayoutChange {
                reason: LayoutReason::EngineHandover { .. },
            } => "engine_handover",
            ScrollEvent::LayoutChange { .. } => "layout_change",
        }
    }

    /// Playback position carried by the event, if any
    pub fn position_ms(&self) -> Option<u64> {
        match *self {
            ScrollEvent::IndexChange { position_ms, .. } | ScrollEvent::Seek { position_ms, .. } => {
                Some(position_ms)
            }
            ScrollEvent::LayoutChange {
                reason: LayoutReason::EngineHandover { position_ms, .. },
            } => Some(position_ms),
            ScrollEvent::LayoutChange { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_layout_events() {
        assert_eq!(ScrollEvent::layout(LayoutReason::Font).position_ms(), None);
        let handover = ScrollEvent::layout(LayoutReason::EngineHandover {
            idx: Some(2),
            position_ms: 6000,
        });
        assert_eq!(handover.position_ms(), Some(6000));
        assert_eq!(handover.kind(), "engine_handover");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ScrollEvent::index_change(1, 3500).kind(), "index_change");
        let seek = ScrollEvent::Seek {
            idx: Some(3),
            position_ms: 9200,
            delta_ms: 8700,
            index_delta: 3,
        };
        assert_eq!(seek.kind(), "seek");
        assert_eq!(seek.position_ms(), Some(9200));
    }
}
