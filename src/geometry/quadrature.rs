//! Quadrature point sets on reference domains.
//!
//! Reference domains:
//! - `Line`: `\xi \in [-1, 1]`.
//! - `Triangle`: `(r, s)` in the unit right triangle (area 1/2).
//! - `Square`: `(r, s) \in [-1, 1]^2`.
//! - `Tetrahedron`: `(r, s, t)` in the unit tetrahedron (volume 1/6).
//! - `Cube`: `(r, s, t) \in [-1, 1]^3`.

use crate::geometry_error::GeometryError;

/// Reference domain an integration rule is defined on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntegrationDomain {
    Line,
    Triangle,
    Square,
    Tetrahedron,
    Cube,
}

/// One quadrature location with its weight.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraturePoint {
    pub coords: Vec<f64>,
    pub weight: f64,
}

impl IntegrationDomain {
    /// Reference dimension.
    pub fn dimension(self) -> usize {
        match self {
            IntegrationDomain::Line => 1,
            IntegrationDomain::Triangle | IntegrationDomain::Square => 2,
            IntegrationDomain::Tetrahedron | IntegrationDomain::Cube => 3,
        }
    }

    /// Measure of the reference domain (the sum of any rule's weights).
    pub fn reference_measure(self) -> f64 {
        match self {
            IntegrationDomain::Line => 2.0,
            IntegrationDomain::Triangle => 0.5,
            IntegrationDomain::Square => 4.0,
            IntegrationDomain::Tetrahedron => 1.0 / 6.0,
            IntegrationDomain::Cube => 8.0,
        }
    }

    /// Quadrature with exactly `nip` points.
    pub fn points(self, nip: usize) -> Result<Vec<QuadraturePoint>, GeometryError> {
        let unsupported = || {
            GeometryError::UnsupportedIntegration(format!("{nip} points on {self:?}"))
        };
        match self {
            IntegrationDomain::Line => gauss_legendre_1d(nip).ok_or_else(unsupported),
            IntegrationDomain::Triangle => triangle_points(nip).ok_or_else(unsupported),
            IntegrationDomain::Tetrahedron => tetrahedron_points(nip).ok_or_else(unsupported),
            IntegrationDomain::Square => {
                let n = exact_root(nip, 2).ok_or_else(unsupported)?;
                let line = gauss_legendre_1d(n).ok_or_else(unsupported)?;
                Ok(tensor_product(&tensor_product(&[unit()], &line), &line))
            }
            IntegrationDomain::Cube => {
                let n = exact_root(nip, 3).ok_or_else(unsupported)?;
                let line = gauss_legendre_1d(n).ok_or_else(unsupported)?;
                let square = tensor_product(&tensor_product(&[unit()], &line), &line);
                Ok(tensor_product(&square, &line))
            }
        }
    }
}

fn unit() -> QuadraturePoint {
    QuadraturePoint {
        coords: Vec::new(),
        weight: 1.0,
    }
}

fn exact_root(n: usize, power: u32) -> Option<usize> {
    (1..=n).find(|k| k.pow(power) == n)
}

/// Gauss–Legendre points on `[-1, 1]`, orders 1 through 4.
fn gauss_legendre_1d(order: usize) -> Option<Vec<QuadraturePoint>> {
    let pairs: Vec<(f64, f64)> = match order {
        1 => vec![(0.0, 2.0)],
        2 => {
            let pt = 1.0_f64 / 3.0_f64.sqrt();
            vec![(-pt, 1.0), (pt, 1.0)]
        }
        3 => {
            let pt = (3.0_f64 / 5.0).sqrt();
            vec![(-pt, 5.0 / 9.0), (0.0, 8.0 / 9.0), (pt, 5.0 / 9.0)]
        }
        4 => {
            let a = (3.0 / 7.0 - 2.0 / 7.0 * (6.0_f64 / 5.0).sqrt()).sqrt();
            let b = (3.0 / 7.0 + 2.0 / 7.0 * (6.0_f64 / 5.0).sqrt()).sqrt();
            let wa = (18.0 + 30.0_f64.sqrt()) / 36.0;
            let wb = (18.0 - 30.0_f64.sqrt()) / 36.0;
            vec![(-b, wb), (-a, wa), (a, wa), (b, wb)]
        }
        _ => return None,
    };
    Some(
        pairs
            .into_iter()
            .map(|(x, w)| QuadraturePoint {
                coords: vec![x],
                weight: w,
            })
            .collect(),
    )
}

fn tensor_product(a: &[QuadraturePoint], b: &[QuadraturePoint]) -> Vec<QuadraturePoint> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for pa in a {
        for pb in b {
            let mut coords = Vec::with_capacity(pa.coords.len() + pb.coords.len());
            coords.extend_from_slice(&pa.coords);
            coords.extend_from_slice(&pb.coords);
            out.push(QuadraturePoint {
                coords,
                weight: pa.weight * pb.weight,
            });
        }
    }
    out
}

fn triangle_points(nip: usize) -> Option<Vec<QuadraturePoint>> {
    let raw: Vec<([f64; 2], f64)> = match nip {
        1 => vec![([1.0 / 3.0, 1.0 / 3.0], 0.5)],
        3 => vec![
            ([1.0 / 6.0, 1.0 / 6.0], 1.0 / 6.0),
            ([2.0 / 3.0, 1.0 / 6.0], 1.0 / 6.0),
            ([1.0 / 6.0, 2.0 / 3.0], 1.0 / 6.0),
        ],
        4 => vec![
            ([1.0 / 3.0, 1.0 / 3.0], -27.0 / 96.0),
            ([0.6, 0.2], 25.0 / 96.0),
            ([0.2, 0.6], 25.0 / 96.0),
            ([0.2, 0.2], 25.0 / 96.0),
        ],
        _ => return None,
    };
    Some(
        raw.into_iter()
            .map(|(c, w)| QuadraturePoint {
                coords: c.to_vec(),
                weight: w,
            })
            .collect(),
    )
}

fn tetrahedron_points(nip: usize) -> Option<Vec<QuadraturePoint>> {
    match nip {
        1 => Some(vec![QuadraturePoint {
            coords: vec![0.25, 0.25, 0.25],
            weight: 1.0 / 6.0,
        }]),
        4 => {
            let a = 0.5854101966249685; // (5 + √5) / 20
            let b = 0.1381966011250105; // (5 - √5) / 20
            let w = 1.0 / 24.0;
            Some(
                [[b, b, b], [a, b, b], [b, a, b], [b, b, a]]
                    .into_iter()
                    .map(|c| QuadraturePoint {
                        coords: c.to_vec(),
                        weight: w,
                    })
                    .collect(),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_sum(pts: &[QuadraturePoint]) -> f64 {
        pts.iter().map(|p| p.weight).sum()
    }

    #[test]
    fn weights_sum_to_reference_measure() {
        let cases = [
            (IntegrationDomain::Line, vec![1, 2, 3, 4]),
            (IntegrationDomain::Triangle, vec![1, 3, 4]),
            (IntegrationDomain::Square, vec![1, 4, 9, 16]),
            (IntegrationDomain::Tetrahedron, vec![1, 4]),
            (IntegrationDomain::Cube, vec![1, 8, 27, 64]),
        ];
        for (domain, nips) in cases {
            for nip in nips {
                let pts = domain.points(nip).unwrap();
                assert_eq!(pts.len(), nip);
                assert!(pts.iter().all(|p| p.coords.len() == domain.dimension()));
                assert!(
                    (weight_sum(&pts) - domain.reference_measure()).abs() < 1e-12,
                    "{domain:?} nip={nip}"
                );
            }
        }
    }

    #[test]
    fn gauss_two_point_integrates_cubic_exactly() {
        let pts = IntegrationDomain::Line.points(2).unwrap();
        let integral: f64 = pts.iter().map(|p| p.weight * p.coords[0].powi(3) + p.weight * p.coords[0].powi(2)).sum();
        assert!((integral - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unsupported_counts_are_errors() {
        assert!(IntegrationDomain::Square.points(3).is_err());
        assert!(IntegrationDomain::Triangle.points(2).is_err());
        assert!(IntegrationDomain::Cube.points(0).is_err());
    }
}
