use std::sync::Arc;

use parking_lot::RwLock;

use crate::render::{Layout, LineMeasurer, Measurement};

#[derive(Debug, Default)]
struct GeometryState {
    centers: Vec<Option<f64>>,
    midpoint_px: f64,
}

/// Line measurements published by the renderer and read by the sync engine.
///
/// Cloning shares the same underlying geometry.
#[derive(Debug, Clone, Default)]
pub struct SharedGeometry {
    state: Arc<RwLock<GeometryState>>,
}

impl SharedGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line measured, plus the container midpoint
    pub fn with_centers(centers: impl IntoIterator<Item = f64>, midpoint_px: f64) -> Self {
        let geometry = Self::new();
        geometry.replace(centers.into_iter().map(Some).collect(), midpoint_px);
        geometry
    }

    /// Replace all measurements at once; `None` marks a line that is not laid out
    pub fn replace(&self, centers: Vec<Option<f64>>, midpoint_px: f64) {
        let mut state = self.state.write();
        state.centers = centers;
        state.midpoint_px = midpoint_px;
    }

    pub fn set_center(&self, index: usize, center_px: f64) {
        let mut state = self.state.write();
        if state.centers.len() <= index {
            state.centers.resize(index + 1, None);
        }
        state.centers[index] = Some(center_px);
    }

    pub fn set_midpoint(&self, midpoint_px: f64) {
        self.state.write().midpoint_px = midpoint_px;
    }

    /// Forget all line measurements (new lyrics not laid out yet)
    pub fn invalidate(&self) {
        self.state.write().centers.clear();
    }

    pub fn measured_lines(&self) -> usize {
        self.state.read().centers.iter().filter(|c| c.is_some()).count()
    }
}

impl LineMeasurer for SharedGeometry {
    fn measure(&self, index: usize) -> Measurement {
        match self.state.read().centers.get(index).copied().flatten() {
            Some(center_offset_px) => Measurement::Ready { center_offset_px },
            None => Measurement::NotReady,
        }
    }
}

impl Layout for SharedGeometry {
    fn container_midpoint_px(&self) -> f64 {
        self.state.read().midpoint_px
    }
}
