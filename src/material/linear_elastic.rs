//! Isotropic linear elasticity, the reference material.

use super::{Capabilities, InternalStateType, Material, MaterialMode, MaterialStatus};
use crate::algs::comm_buffer::UnpackBuffer;
use crate::geometry_error::GeometryError;

/// Isotropic linear-elastic material with an optional block of history
/// variables carried along unchanged (useful for exercising state transfer).
#[derive(Clone, Debug, PartialEq)]
pub struct LinearElasticMaterial {
    pub young_modulus: f64,
    pub poisson_ratio: f64,
    history_size: usize,
    capabilities: Capabilities,
}

impl LinearElasticMaterial {
    pub fn new(young_modulus: f64, poisson_ratio: f64) -> Self {
        Self {
            young_modulus,
            poisson_ratio,
            history_size: 0,
            capabilities: Capabilities::ALL,
        }
    }

    pub fn with_history_size(mut self, n: usize) -> Self {
        self.history_size = n;
        self
    }

    /// Restrict the supported modes.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }
}

/// Von Mises equivalent stress from a reduced stress vector.
fn von_mises(stress: &[f64], mode: MaterialMode) -> f64 {
    let (sx, sy, sz, txy, tyz, tzx) = match mode {
        MaterialMode::OneD => (stress[0], 0.0, 0.0, 0.0, 0.0, 0.0),
        MaterialMode::PlaneStress => (stress[0], stress[1], 0.0, stress[2], 0.0, 0.0),
        MaterialMode::PlaneStrain => (stress[0], stress[1], stress[2], stress[3], 0.0, 0.0),
        MaterialMode::ThreeD => (stress[0], stress[1], stress[2], stress[5], stress[3], stress[4]),
    };
    (0.5 * ((sx - sy).powi(2) + (sy - sz).powi(2) + (sz - sx).powi(2))
        + 3.0 * (txy * txy + tyz * tyz + tzx * tzx))
        .sqrt()
}

impl Material for LinearElasticMaterial {
    fn name(&self) -> &str {
        "IsoLE"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_status(&self, mode: MaterialMode) -> MaterialStatus {
        MaterialStatus::new(mode.strain_size(), self.history_size)
    }

    fn give_ip_value(
        &self,
        status: &MaterialStatus,
        kind: InternalStateType,
        mode: MaterialMode,
    ) -> Option<Vec<f64>> {
        match kind {
            InternalStateType::Stress => Some(status.stress().to_vec()),
            InternalStateType::Strain => Some(status.strain().to_vec()),
            InternalStateType::HistoryVariables if self.history_size > 0 => {
                Some(status.history().to_vec())
            }
            InternalStateType::VonMisesStress if status.stress().len() == mode.strain_size() => {
                Some(vec![von_mises(status.stress(), mode)])
            }
            _ => None,
        }
    }

    fn estimate_pack_size(&self, mode: MaterialMode) -> usize {
        MaterialStatus::packed_len_for(mode.strain_size(), self.history_size)
    }

    fn unpack_status(
        &self,
        mode: MaterialMode,
        buf: &mut UnpackBuffer,
    ) -> Result<MaterialStatus, GeometryError> {
        let status = MaterialStatus::unpack(buf)?;
        if status.strain_size() != mode.strain_size() || status.history_size() != self.history_size
        {
            return Err(GeometryError::ProtocolDesync(format!(
                "{} status shape {}x{} does not match {:?} with {} history variables",
                self.name(),
                status.strain_size(),
                status.history_size(),
                mode,
                self.history_size
            )));
        }
        Ok(status)
    }
}
