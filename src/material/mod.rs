//! Material and cross-section collaborators.
//!
//! The element layer never evaluates a constitutive law. It decides which
//! integration points are visited and in which order, and hands each point's
//! [`MaterialStatus`] to the [`Material`] / [`CrossSection`] pair registered in
//! the [`Domain`](crate::mesh::Domain). Everything physically meaningful
//! (stress, per-point volume factor, serialized payload) comes from here.

pub mod cross_section;
pub mod linear_elastic;
pub mod status;

pub use cross_section::SimpleCrossSection;
pub use linear_elastic::LinearElasticMaterial;
pub use status::{MaterialStatus, StatusHandle, StatusStore};

use crate::algs::comm_buffer::{PackBuffer, UnpackBuffer};
use crate::data::stream::DataStream;
use crate::data::time::TimeStep;
use crate::geometry_error::GeometryError;

/// Capability flags a material or cross section may provide.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const ONE_D: Capabilities = Capabilities(1 << 0);
    pub const PLANE_STRESS: Capabilities = Capabilities(1 << 1);
    pub const PLANE_STRAIN: Capabilities = Capabilities(1 << 2);
    pub const THREE_D: Capabilities = Capabilities(1 << 3);
    pub const ALL: Capabilities = Capabilities(0b1111);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// Returns true if every flag in `other` is set in `self`.
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// Capability needed to evaluate points in `mode`.
    pub const fn for_mode(mode: MaterialMode) -> Capabilities {
        match mode {
            MaterialMode::OneD => Capabilities::ONE_D,
            MaterialMode::PlaneStress => Capabilities::PLANE_STRESS,
            MaterialMode::PlaneStrain => Capabilities::PLANE_STRAIN,
            MaterialMode::ThreeD => Capabilities::THREE_D,
        }
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;
    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

/// Stress/strain state assumed at an integration point.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum MaterialMode {
    OneD,
    PlaneStress,
    PlaneStrain,
    #[default]
    ThreeD,
}

impl MaterialMode {
    /// Number of components of the reduced strain (and stress) vector.
    pub const fn strain_size(self) -> usize {
        match self {
            MaterialMode::OneD => 1,
            MaterialMode::PlaneStress => 3,
            MaterialMode::PlaneStrain => 4,
            MaterialMode::ThreeD => 6,
        }
    }
}

/// Quantity that may be queried at an integration point.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InternalStateType {
    /// Committed stress vector.
    Stress,
    /// Committed strain vector.
    Strain,
    /// Committed history variables.
    HistoryVariables,
    /// Von Mises equivalent of the committed stress.
    VonMisesStress,
    /// Scalar damage; only provided by damage models.
    Damage,
}

/// Constitutive model registered in a domain.
pub trait Material: Send + Sync {
    fn name(&self) -> &str;

    /// Modes this model can be evaluated in.
    fn capabilities(&self) -> Capabilities;

    /// Fresh, zeroed status for one integration point.
    fn create_status(&self, mode: MaterialMode) -> MaterialStatus;

    /// Reset the trial state to the last equilibrium state.
    fn init_temp_status(&self, status: &mut MaterialStatus) {
        status.init_temp();
    }

    /// Commit the trial state of a converged step.
    fn update_status(&self, status: &mut MaterialStatus, _step: &TimeStep) {
        status.commit();
    }

    /// Point value of `kind`, or `None` if this model does not provide it.
    fn give_ip_value(
        &self,
        status: &MaterialStatus,
        kind: InternalStateType,
        mode: MaterialMode,
    ) -> Option<Vec<f64>>;

    /// Upper bound on the bytes [`Material::pack_status`] writes for `mode`.
    fn estimate_pack_size(&self, mode: MaterialMode) -> usize;

    fn pack_status(&self, status: &MaterialStatus, buf: &mut PackBuffer) {
        status.pack(buf);
    }

    fn unpack_status(
        &self,
        mode: MaterialMode,
        buf: &mut UnpackBuffer,
    ) -> Result<MaterialStatus, GeometryError>;

    /// Seed `target`'s trial state from the equilibrium state of `source`.
    fn map_status(&self, source: &MaterialStatus, target: &mut MaterialStatus) {
        target.assign_temp_from(source);
    }

    /// Relative cost of one point evaluation, 1.0 for linear elasticity.
    fn relative_computational_cost(&self) -> f64 {
        1.0
    }
}

/// Section properties combined with the material at a point.
pub trait CrossSection: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Factor turning a reference-domain measure of dimension `dim` into a
    /// volume (thickness in 2-D, area in 1-D).
    fn volume_factor(&self, dim: usize) -> f64;

    fn give_ip_value(
        &self,
        material: &dyn Material,
        status: &MaterialStatus,
        kind: InternalStateType,
        mode: MaterialMode,
    ) -> Option<Vec<f64>> {
        material.give_ip_value(status, kind, mode)
    }

    fn estimate_pack_size(&self, material: &dyn Material, mode: MaterialMode) -> usize {
        material.estimate_pack_size(mode)
    }

    fn pack_unknowns(&self, material: &dyn Material, status: &MaterialStatus, buf: &mut PackBuffer) {
        material.pack_status(status, buf);
    }

    fn unpack_unknowns(
        &self,
        material: &dyn Material,
        mode: MaterialMode,
        buf: &mut UnpackBuffer,
    ) -> Result<MaterialStatus, GeometryError> {
        material.unpack_status(mode, buf)
    }

    fn save_ip_context(&self, status: &MaterialStatus, stream: &mut dyn DataStream) {
        status.save_context(stream);
    }

    fn restore_ip_context(
        &self,
        stream: &mut dyn DataStream,
    ) -> Result<MaterialStatus, GeometryError> {
        MaterialStatus::restore_context(stream)
    }

    fn relative_computational_cost(&self) -> f64 {
        1.0
    }
}
