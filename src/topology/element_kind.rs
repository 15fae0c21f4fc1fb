//! Closed set of element kinds and the geometry interface they share.
//!
//! Per-kind behaviour (dof masks, integration-rule factory, interpolation,
//! load-balancing weight) lives behind [`ElementGeometry`]; the element entity
//! dispatches on its [`ElementKind`] tag and never needs a subtype.

use crate::data::dof::{DofId, EquationKind};
use crate::geometry::interpolation::Interpolation;
use crate::geometry::quadrature::IntegrationDomain;
use crate::geometry_error::GeometryError;
use crate::integration::rule::IntegrationRule;
use crate::material::{Capabilities, MaterialMode};

/// Supported element kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ElementKind {
    /// 2-node bar.
    Truss1d,
    /// 3-node plane-stress triangle.
    PlaneStressTriangle,
    /// 4-node plane-stress quadrilateral.
    PlaneStressQuad,
    /// 4-node linear tetrahedron.
    Tetrahedron,
    /// 8-node linear brick.
    Brick,
}

/// Geometry and discretization capabilities of an element kind.
pub trait ElementGeometry {
    /// Input-record keyword.
    fn name(&self) -> &'static str;
    fn spatial_dimension(&self) -> usize;
    fn number_of_dof_managers(&self) -> usize;
    fn interpolation(&self) -> Interpolation;
    fn integration_domain(&self) -> IntegrationDomain;
    /// Point count used when the input record gives no `nip`.
    fn default_nip(&self) -> usize;
    fn material_mode(&self) -> MaterialMode;
    fn number_of_boundary_sides(&self) -> usize;
    /// Dofs used at every node for `eq`; empty if the kind does not take
    /// part in that equation.
    fn dof_mask(&self, eq: EquationKind) -> &'static [DofId];
    /// Relative cost of one element evaluation, linear triangle = 1.
    fn relative_self_cost(&self) -> f64;

    /// Capabilities the material and cross section must both provide.
    fn required_capabilities(&self) -> Capabilities {
        Capabilities::for_mode(self.material_mode())
    }

    /// Build the element's integration rules ("compute Gauss points").
    fn build_rules(&self, nip: Option<usize>) -> Result<Vec<IntegrationRule>, GeometryError> {
        let mut rule = IntegrationRule::new(1, self.integration_domain(), self.material_mode());
        rule.set_up_integration_points(nip.unwrap_or_else(|| self.default_nip()))?;
        Ok(vec![rule])
    }
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Truss1d,
        ElementKind::PlaneStressTriangle,
        ElementKind::PlaneStressQuad,
        ElementKind::Tetrahedron,
        ElementKind::Brick,
    ];

    /// Look up a kind by its input-record keyword.
    pub fn from_name(name: &str) -> Option<ElementKind> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl ElementGeometry for ElementKind {
    fn name(&self) -> &'static str {
        match self {
            ElementKind::Truss1d => "truss1d",
            ElementKind::PlaneStressTriangle => "trplanestress2d",
            ElementKind::PlaneStressQuad => "planestress2d",
            ElementKind::Tetrahedron => "ltrspace",
            ElementKind::Brick => "lspace",
        }
    }

    fn spatial_dimension(&self) -> usize {
        self.interpolation().dimension()
    }

    fn number_of_dof_managers(&self) -> usize {
        self.interpolation().number_of_nodes()
    }

    fn interpolation(&self) -> Interpolation {
        match self {
            ElementKind::Truss1d => Interpolation::Line2,
            ElementKind::PlaneStressTriangle => Interpolation::Triangle3,
            ElementKind::PlaneStressQuad => Interpolation::Quad4,
            ElementKind::Tetrahedron => Interpolation::Tetra4,
            ElementKind::Brick => Interpolation::Hexa8,
        }
    }

    fn integration_domain(&self) -> IntegrationDomain {
        self.interpolation().integration_domain()
    }

    fn default_nip(&self) -> usize {
        match self {
            ElementKind::Truss1d | ElementKind::PlaneStressTriangle | ElementKind::Tetrahedron => 1,
            ElementKind::PlaneStressQuad => 4,
            ElementKind::Brick => 8,
        }
    }

    fn material_mode(&self) -> MaterialMode {
        match self {
            ElementKind::Truss1d => MaterialMode::OneD,
            ElementKind::PlaneStressTriangle | ElementKind::PlaneStressQuad => {
                MaterialMode::PlaneStress
            }
            ElementKind::Tetrahedron | ElementKind::Brick => MaterialMode::ThreeD,
        }
    }

    fn number_of_boundary_sides(&self) -> usize {
        match self {
            ElementKind::Truss1d => 2,
            ElementKind::PlaneStressTriangle => 3,
            ElementKind::PlaneStressQuad | ElementKind::Tetrahedron => 4,
            ElementKind::Brick => 6,
        }
    }

    fn dof_mask(&self, eq: EquationKind) -> &'static [DofId] {
        match eq {
            EquationKind::Momentum => DofId::displacements(self.spatial_dimension() as u8),
            EquationKind::HeatTransfer => &[],
        }
    }

    fn relative_self_cost(&self) -> f64 {
        match self {
            ElementKind::Truss1d => 0.5,
            ElementKind::PlaneStressTriangle => 1.0,
            ElementKind::PlaneStressQuad => 1.5,
            ElementKind::Tetrahedron => 2.0,
            ElementKind::Brick => 4.0,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
