//! Playback position signal and the two engines that may own it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the playback backend that is authoritative for the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineId {
    /// Low-latency native engine
    Native,
    /// In-process decoding engine used for fast seeking
    InProcess,
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineId::Native => f.write_str("native"),
            EngineId::InProcess => f.write_str("in_process"),
        }
    }
}

pub trait PositionSource {
    /// Current playback position in milliseconds. May be negative or NaN on bad input.
    fn position_ms(&self) -> f64;

    fn current_engine(&self) -> EngineId;

    /// Read position and engine together
    fn sample(&self) -> PositionSample {
        PositionSample {
            position_ms: self.position_ms(),
            engine: self.current_engine(),
        }
    }
}

/// One reading of the position signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub position_ms: f64,
    pub engine: EngineId,
}

impl PositionSample {
    pub fn new(position_ms: f64, engine: EngineId) -> Self {
        Self { position_ms, engine }
    }

    /// Position as whole milliseconds; negative, NaN and infinite readings become 0
    pub fn sanitized_ms(&self) -> u64 {
        sanitize_position(self.position_ms)
    }
}

/// Treat malformed positions as 0 instead of letting them reach the index
pub fn sanitize_position(position_ms: f64) -> u64 {
    if position_ms.is_finite() && position_ms > 0.0 {
        position_ms.round() as u64
    } else {
        0
    }
}

/// Two independent backends that alternately own the position signal
pub struct DualEngineSource<N, P> {
    native: N,
    in_process: P,
    active: EngineId,
}

impl<N, P> DualEngineSource<N, P>
where
    N: Fn() -> f64,
    P: Fn() -> f64,
{
    pub fn new(native: N, in_process: P) -> Self {
        Self {
            native,
            in_process,
            active: EngineId::Native,
        }
    }

    /// Make `engine` authoritative. Returns true when ownership actually changed.
    pub fn hand_over(&mut self, engine: EngineId) -> bool {
        if self.active == engine {
            return false;
        }
        tracing::debug!(from = %self.active, to = %engine, "Position engine handover");
        self.active = engine;
        true
    }

    #[inline]
    pub fn active(&self) -> EngineId {
        self.active
    }
}

impl<N, P> PositionSource for DualEngineSource<N, P>
where
    N: Fn() -> f64,
    P: Fn() -> f64,
{
    fn position_ms(&self) -> f64 {
        match self.active {
            EngineId::Native => (self.native)(),
            EngineId::InProcess => (self.in_process)(),
        }
    }

    fn current_engine(&self) -> EngineId {
        self.active
    }
}

/// Fixed position, settable; used by tests and scripted playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition {
    pub position_ms: f64,
    pub engine: EngineId,
}

impl FixedPosition {
    pub fn new(position_ms: f64) -> Self {
        Self {
            position_ms,
            engine: EngineId::Native,
        }
    }

    pub fn on(mut self, engine: EngineId) -> Self {
        self.engine = engine;
        self
    }
}

impl PositionSource for FixedPosition {
    fn position_ms(&self) -> f64 {
        self.position_ms
    }

    fn current_engine(&self) -> EngineId {
        self.engine
    }
}
