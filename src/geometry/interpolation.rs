//! Linear Lagrange interpolation over the reference domains.
//!
//! Node ordering:
//! - `Line2`: `[v0, v1]` at `\xi = -1, 1`.
//! - `Triangle3`: `[v0, v1, v2]` at `(0,0), (1,0), (0,1)`.
//! - `Quad4`: counter-clockwise from `(-1,-1)`.
//! - `Tetra4`: `[v0, v1, v2, v3]` at the origin and the unit axes.
//! - `Hexa8`: bottom face counter-clockwise from `(-1,-1,-1)`, then the top face.
//!
//! Physical coordinates are always 3-vectors; 1-D and 2-D cells may be embedded
//! in space, in which case the Jacobian "determinant" is the length or area
//! scale of the mapping.

use crate::geometry::quadrature::IntegrationDomain;
use crate::geometry_error::GeometryError;

const NEWTON_MAX_ITERS: usize = 25;
const NEWTON_TOL: f64 = 1e-12;
const EPS: f64 = 1e-14;

const QUAD_NODES: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const HEXA_NODES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Geometry interpolation of an element kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Interpolation {
    Line2,
    Triangle3,
    Quad4,
    Tetra4,
    Hexa8,
}

impl Interpolation {
    /// Reference dimension.
    pub fn dimension(self) -> usize {
        self.integration_domain().dimension()
    }

    pub fn number_of_nodes(self) -> usize {
        match self {
            Interpolation::Line2 => 2,
            Interpolation::Triangle3 => 3,
            Interpolation::Quad4 => 4,
            Interpolation::Tetra4 => 4,
            Interpolation::Hexa8 => 8,
        }
    }

    pub fn integration_domain(self) -> IntegrationDomain {
        match self {
            Interpolation::Line2 => IntegrationDomain::Line,
            Interpolation::Triangle3 => IntegrationDomain::Triangle,
            Interpolation::Quad4 => IntegrationDomain::Square,
            Interpolation::Tetra4 => IntegrationDomain::Tetrahedron,
            Interpolation::Hexa8 => IntegrationDomain::Cube,
        }
    }

    /// Reference-domain centroid.
    pub fn reference_center(self) -> Vec<f64> {
        match self {
            Interpolation::Line2 => vec![0.0],
            Interpolation::Triangle3 => vec![1.0 / 3.0, 1.0 / 3.0],
            Interpolation::Quad4 => vec![0.0, 0.0],
            Interpolation::Tetra4 => vec![0.25, 0.25, 0.25],
            Interpolation::Hexa8 => vec![0.0, 0.0, 0.0],
        }
    }

    /// Shape function values `N_a(\xi)`.
    fn shape_values(self, lc: &[f64]) -> Vec<f64> {
        match self {
            Interpolation::Line2 => vec![0.5 * (1.0 - lc[0]), 0.5 * (1.0 + lc[0])],
            Interpolation::Triangle3 => vec![1.0 - lc[0] - lc[1], lc[0], lc[1]],
            Interpolation::Quad4 => QUAD_NODES
                .iter()
                .map(|n| 0.25 * (1.0 + n[0] * lc[0]) * (1.0 + n[1] * lc[1]))
                .collect(),
            Interpolation::Tetra4 => vec![1.0 - lc[0] - lc[1] - lc[2], lc[0], lc[1], lc[2]],
            Interpolation::Hexa8 => HEXA_NODES
                .iter()
                .map(|n| {
                    0.125 * (1.0 + n[0] * lc[0]) * (1.0 + n[1] * lc[1]) * (1.0 + n[2] * lc[2])
                })
                .collect(),
        }
    }

    /// Reference derivatives `dN_a/d\xi_i`, indexed `[a][i]` (unused `i` are zero).
    fn shape_derivatives(self, lc: &[f64]) -> Vec<[f64; 3]> {
        match self {
            Interpolation::Line2 => vec![[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0]],
            Interpolation::Triangle3 => {
                vec![[-1.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            }
            Interpolation::Quad4 => QUAD_NODES
                .iter()
                .map(|n| {
                    [
                        0.25 * n[0] * (1.0 + n[1] * lc[1]),
                        0.25 * n[1] * (1.0 + n[0] * lc[0]),
                        0.0,
                    ]
                })
                .collect(),
            Interpolation::Tetra4 => vec![
                [-1.0, -1.0, -1.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            Interpolation::Hexa8 => HEXA_NODES
                .iter()
                .map(|n| {
                    let (a, b, c) = (
                        1.0 + n[0] * lc[0],
                        1.0 + n[1] * lc[1],
                        1.0 + n[2] * lc[2],
                    );
                    [
                        0.125 * n[0] * b * c,
                        0.125 * n[1] * a * c,
                        0.125 * n[2] * a * b,
                    ]
                })
                .collect(),
        }
    }

    /// Jacobian rows `J_i = sum_a dN_a/d\xi_i x_a`, one per reference direction.
    pub fn jacobian(self, lc: &[f64], nodes: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, GeometryError> {
        self.check_nodes(nodes)?;
        self.check_local(lc)?;
        let dim = self.dimension();
        let ders = self.shape_derivatives(lc);
        let mut rows = vec![[0.0; 3]; dim];
        for (d, x) in ders.iter().zip(nodes) {
            for (i, row) in rows.iter_mut().enumerate() {
                for k in 0..3 {
                    row[k] += d[i] * x[k];
                }
            }
        }
        Ok(rows)
    }

    /// Length, area or volume scale of the mapping at `lc` (always non-negative).
    pub fn jacobian_measure(self, lc: &[f64], nodes: &[[f64; 3]]) -> Result<f64, GeometryError> {
        let rows = self.jacobian(lc, nodes)?;
        let measure = match rows.len() {
            1 => norm(rows[0]),
            2 => norm(cross(rows[0], rows[1])),
            _ => dot(rows[0], cross(rows[1], rows[2])).abs(),
        };
        if !measure.is_finite() || measure < EPS {
            return Err(GeometryError::InvalidGeometry(format!(
                "degenerate {self:?} mapping (jacobian measure {measure:e})"
            )));
        }
        Ok(measure)
    }

    /// Physical coordinates of the reference point `lc`.
    pub fn global_coordinates(
        self,
        lc: &[f64],
        nodes: &[[f64; 3]],
    ) -> Result<[f64; 3], GeometryError> {
        self.check_nodes(nodes)?;
        self.check_local(lc)?;
        let n = self.shape_values(lc);
        let mut x = [0.0; 3];
        for (na, xa) in n.iter().zip(nodes) {
            for k in 0..3 {
                x[k] += na * xa[k];
            }
        }
        Ok(x)
    }

    /// Reference coordinates of the physical point `gc`.
    ///
    /// Coordinates are computed even for points outside the element (the
    /// mapping is extended); the flag reports whether the point lies inside
    /// within `tol` in reference coordinates. For cells embedded in a
    /// higher-dimensional space the closest point in the cell's plane is used.
    pub fn local_coordinates(
        self,
        gc: [f64; 3],
        nodes: &[[f64; 3]],
        tol: f64,
    ) -> Result<(Vec<f64>, bool), GeometryError> {
        let dim = self.dimension();
        let mut lc = self.reference_center();
        for _ in 0..NEWTON_MAX_ITERS {
            let x = self.global_coordinates(&lc, nodes)?;
            let r = sub(gc, x);
            let rows = self.jacobian(&lc, nodes)?;
            // normal equations (J J^T) d = J r
            let mut a = [[0.0; 3]; 3];
            let mut b = [0.0; 3];
            for i in 0..dim {
                b[i] = dot(rows[i], r);
                for j in 0..dim {
                    a[i][j] = dot(rows[i], rows[j]);
                }
            }
            let delta = solve_small(a, b, dim).ok_or_else(|| {
                GeometryError::InvalidGeometry(format!("singular {self:?} mapping"))
            })?;
            let mut step = 0.0_f64;
            for i in 0..dim {
                lc[i] += delta[i];
                step = step.max(delta[i].abs());
            }
            if step < NEWTON_TOL {
                break;
            }
        }
        let inside = self.contains_reference_point(&lc, tol);
        Ok((lc, inside))
    }

    /// Reference-domain membership test with tolerance.
    pub fn contains_reference_point(self, lc: &[f64], tol: f64) -> bool {
        match self {
            Interpolation::Line2 | Interpolation::Quad4 | Interpolation::Hexa8 => {
                lc.iter().all(|x| x.abs() <= 1.0 + tol)
            }
            Interpolation::Triangle3 | Interpolation::Tetra4 => {
                lc.iter().all(|&x| x >= -tol) && lc.iter().sum::<f64>() <= 1.0 + tol
            }
        }
    }

    fn check_nodes(self, nodes: &[[f64; 3]]) -> Result<(), GeometryError> {
        let expected = self.number_of_nodes();
        if nodes.len() != expected {
            return Err(GeometryError::InvalidGeometry(format!(
                "vertex count mismatch: expected {expected}, got {}",
                nodes.len()
            )));
        }
        Ok(())
    }

    fn check_local(self, lc: &[f64]) -> Result<(), GeometryError> {
        let dim = self.dimension();
        if lc.len() != dim {
            return Err(GeometryError::InvalidGeometry(format!(
                "{self:?} takes {dim} local coordinates, got {}",
                lc.len()
            )));
        }
        Ok(())
    }
}

/// Gaussian elimination with partial pivoting on the leading `n x n` block.
fn solve_small(mut a: [[f64; 3]; 3], mut b: [f64; 3], n: usize) -> Option<[f64; 3]> {
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < EPS {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = [0.0; 3];
    for row in (0..n).rev() {
        let mut s = b[row];
        for k in row + 1..n {
            s -= a[row][k] * x[k];
        }
        x[row] = s / a[row][row];
    }
    Some(x)
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn normalize(a: [f64; 3]) -> Option<[f64; 3]> {
    let n = norm(a);
    (n > EPS).then(|| [a[0] / n, a[1] / n, a[2] / n])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRI: [[f64; 3]; 3] = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    #[test]
    fn partition_of_unity() {
        let cases = [
            (Interpolation::Line2, vec![0.3]),
            (Interpolation::Triangle3, vec![0.2, 0.3]),
            (Interpolation::Quad4, vec![0.1, -0.7]),
            (Interpolation::Tetra4, vec![0.1, 0.2, 0.3]),
            (Interpolation::Hexa8, vec![0.5, -0.5, 0.25]),
        ];
        for (interp, lc) in cases {
            let sum: f64 = interp.shape_values(&lc).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "{interp:?}");
            let dsum: [f64; 3] = interp
                .shape_derivatives(&lc)
                .iter()
                .fold([0.0; 3], |acc, d| [acc[0] + d[0], acc[1] + d[1], acc[2] + d[2]]);
            assert!(dsum.iter().all(|v| v.abs() < 1e-12), "{interp:?}");
        }
    }

    #[test]
    fn triangle_measure_is_twice_area() {
        let m = Interpolation::Triangle3
            .jacobian_measure(&[1.0 / 3.0, 1.0 / 3.0], &TRI)
            .unwrap();
        assert!((m - 2.0).abs() < 1e-12);
    }

    #[test]
    fn local_global_roundtrip_quad() {
        let quad = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.5, 1.5, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let lc = [0.3, -0.4];
        let x = Interpolation::Quad4.global_coordinates(&lc, &quad).unwrap();
        let (back, inside) = Interpolation::Quad4.local_coordinates(x, &quad, 1e-9).unwrap();
        assert!(inside);
        assert!((back[0] - lc[0]).abs() < 1e-9 && (back[1] - lc[1]).abs() < 1e-9);
    }

    #[test]
    fn outside_point_reports_outside() {
        let (lc, inside) = Interpolation::Triangle3
            .local_coordinates([3.0, 3.0, 0.0], &TRI, 1e-9)
            .unwrap();
        assert!(!inside);
        assert!(lc[0] + lc[1] > 1.0);
    }

    #[test]
    fn degenerate_cell_is_rejected() {
        let flat = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert!(matches!(
            Interpolation::Triangle3.jacobian_measure(&[0.2, 0.2], &flat),
            Err(GeometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn wrong_node_count_is_rejected() {
        assert!(Interpolation::Tetra4.global_coordinates(&[0.0; 3], &TRI).is_err());
    }

    #[test]
    fn wrong_local_dimension_is_rejected() {
        for lc in [&[][..], &[0.1, 0.1, 0.1][..]] {
            assert!(matches!(
                Interpolation::Triangle3.global_coordinates(lc, &TRI),
                Err(GeometryError::InvalidGeometry(_))
            ));
            assert!(matches!(
                Interpolation::Triangle3.jacobian(lc, &TRI),
                Err(GeometryError::InvalidGeometry(_))
            ));
        }
    }
}
