//! A single integration point.

use crate::material::{MaterialMode, StatusHandle};

/// Quadrature location with its weight and a handle to material state.
///
/// The status itself lives in the domain's
/// [`StatusStore`](crate::material::StatusStore); a point without a handle
/// has not been attached to a material yet.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussPoint {
    number: usize,
    local_coords: Vec<f64>,
    weight: f64,
    mode: MaterialMode,
    status: Option<StatusHandle>,
}

impl GaussPoint {
    /// `number` is 1-based within the owning rule.
    pub fn new(number: usize, local_coords: Vec<f64>, weight: f64, mode: MaterialMode) -> Self {
        Self {
            number,
            local_coords,
            weight,
            mode,
            status: None,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn local_coordinates(&self) -> &[f64] {
        &self.local_coords
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn material_mode(&self) -> MaterialMode {
        self.mode
    }

    pub fn status(&self) -> Option<StatusHandle> {
        self.status
    }

    pub fn set_status(&mut self, h: StatusHandle) -> Option<StatusHandle> {
        self.status.replace(h)
    }

    pub fn take_status(&mut self) -> Option<StatusHandle> {
        self.status.take()
    }
}
