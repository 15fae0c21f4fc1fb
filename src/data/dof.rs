//! Degrees of freedom and the dof managers that carry them.
//!
//! A [`DofManager`] (node or element side) owns a set of [`Dof`]s. Elements
//! reference dof managers by [`EntityId`] and select the subset they use at
//! each node through a dof-id mask.

use crate::topology::entity_id::EntityId;

/// Physical meaning of a degree of freedom.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum DofId {
    /// Displacement in x.
    Du,
    /// Displacement in y.
    Dv,
    /// Displacement in z.
    Dw,
    /// Rotation about x.
    RotU,
    /// Rotation about y.
    RotV,
    /// Rotation about z.
    RotW,
    /// Temperature.
    Temperature,
    /// Pressure.
    Pressure,
}

impl DofId {
    /// Displacement dofs for the given spatial dimension.
    pub fn displacements(dim: u8) -> &'static [DofId] {
        match dim {
            1 => &[DofId::Du],
            2 => &[DofId::Du, DofId::Dv],
            _ => &[DofId::Du, DofId::Dv, DofId::Dw],
        }
    }
}

/// Equation system a set of dofs belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EquationKind {
    /// Balance of momentum (structural mechanics).
    Momentum,
    /// Heat balance.
    HeatTransfer,
}

/// A single degree of freedom with its (optional) equation number.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dof {
    pub id: DofId,
    /// `None` for prescribed or not-yet-numbered dofs.
    pub equation: Option<usize>,
}

/// Role of a dof manager in the mesh.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DofManagerKind {
    #[default]
    Node,
    ElementSide,
}

/// Entity carrying degrees of freedom, shared between elements.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DofManager {
    number: EntityId,
    global_number: u64,
    kind: DofManagerKind,
    coordinates: [f64; 3],
    dofs: Vec<Dof>,
}

impl DofManager {
    /// A node at `coordinates` with no dofs yet; global number equals local.
    pub fn node(number: EntityId, coordinates: [f64; 3]) -> Self {
        Self {
            number,
            global_number: number.get(),
            kind: DofManagerKind::Node,
            coordinates,
            dofs: Vec::new(),
        }
    }

    /// Builder: attach unnumbered dofs with the given ids.
    pub fn with_dofs(mut self, ids: &[DofId]) -> Self {
        for &id in ids {
            self.add_dof(id);
        }
        self
    }

    pub fn with_global_number(mut self, global: u64) -> Self {
        self.global_number = global;
        self
    }

    pub fn with_kind(mut self, kind: DofManagerKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn number(&self) -> EntityId {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: EntityId) {
        self.number = number;
    }

    pub fn global_number(&self) -> u64 {
        self.global_number
    }

    pub fn kind(&self) -> DofManagerKind {
        self.kind
    }

    pub fn coordinates(&self) -> [f64; 3] {
        self.coordinates
    }

    pub fn dofs(&self) -> &[Dof] {
        &self.dofs
    }

    /// Add a dof if not present yet.
    pub fn add_dof(&mut self, id: DofId) {
        if !self.has_dof(id) {
            self.dofs.push(Dof { id, equation: None });
        }
    }

    pub fn has_dof(&self, id: DofId) -> bool {
        self.dofs.iter().any(|d| d.id == id)
    }

    pub fn dof(&self, id: DofId) -> Option<&Dof> {
        self.dofs.iter().find(|d| d.id == id)
    }

    /// Assign an equation number; returns false if the dof does not exist.
    pub fn set_equation(&mut self, id: DofId, equation: Option<usize>) -> bool {
        match self.dofs.iter_mut().find(|d| d.id == id) {
            Some(dof) => {
                dof.equation = equation;
                true
            }
            None => false,
        }
    }
}
