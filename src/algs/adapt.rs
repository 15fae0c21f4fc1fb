//! Mesh-to-mesh transfer of integration-point state after remeshing.
//!
//! A new point takes its state from an old point found in three stages:
//! 1. an old element containing the point (bounding-box prefilter, then the
//!    inverse geometry map), taking that element's nearest point;
//! 2. if the point is inside the old mesh's bounding box enlarged by
//!    [`MappingConfig::domain_margin`], the old element with the nearest
//!    centroid;
//! 3. otherwise no source, a soft failure.

use crate::data::time::TimeStep;
use crate::element::{ElementEntity, MappingOutcome};
use crate::geometry::interpolation::{dot, sub};
use crate::geometry_error::GeometryError;
use crate::integration::{IpRef, IpTraversal};
use crate::material::{MaterialStatus, StatusHandle};
use crate::mesh::Mesh;
use crate::topology::entity_id::EntityId;
use log::{debug, warn};

/// Tuning of the source search.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MappingConfig {
    /// Reference-coordinate slack when testing containment; also scales the
    /// bounding-box prefilter.
    pub containment_tolerance: f64,
    /// Enlargement of the old mesh's bounding box, relative to its diagonal,
    /// inside which the nearest-centroid fallback applies.
    pub domain_margin: f64,
    /// Whether stage 2 is attempted at all.
    pub allow_nearest_fallback: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            containment_tolerance: 1e-6,
            domain_margin: 0.05,
            allow_nearest_fallback: true,
        }
    }
}

#[derive(Clone, Debug)]
struct LocatorEntry {
    index: usize,
    centroid: [f64; 3],
    lo: [f64; 3],
    hi: [f64; 3],
}

/// Axis-aligned box index over the elements of a mesh.
#[derive(Clone, Debug)]
pub struct SpatialLocator {
    entries: Vec<LocatorEntry>,
    lo: [f64; 3],
    hi: [f64; 3],
}

fn diagonal(lo: [f64; 3], hi: [f64; 3]) -> f64 {
    let d = sub(hi, lo);
    dot(d, d).sqrt()
}

fn inside_box(x: [f64; 3], lo: [f64; 3], hi: [f64; 3], pad: f64) -> bool {
    (0..3).all(|k| x[k] >= lo[k] - pad && x[k] <= hi[k] + pad)
}

impl SpatialLocator {
    /// Index every element of `mesh` that owns integration points.
    pub fn build(mesh: &Mesh) -> Result<Self, GeometryError> {
        let domain = mesh.domain();
        let mut entries = Vec::with_capacity(mesh.number_of_elements());
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for (index, e) in mesh.elements().iter().enumerate() {
            if e.rules().point_count() == 0 {
                continue;
            }
            let (elo, ehi) = e.bounding_box(domain)?;
            for k in 0..3 {
                lo[k] = lo[k].min(elo[k]);
                hi[k] = hi[k].max(ehi[k]);
            }
            entries.push(LocatorEntry {
                index,
                centroid: e.centroid(domain)?,
                lo: elo,
                hi: ehi,
            });
        }
        Ok(Self { entries, lo, hi })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mesh bounding box; inverted (min > max) for an empty index.
    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        (self.lo, self.hi)
    }

    /// Element indices whose box, padded by `rel_pad` of its diagonal,
    /// contains `x`.
    pub fn candidates(&self, x: [f64; 3], rel_pad: f64) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(move |en| inside_box(x, en.lo, en.hi, rel_pad * diagonal(en.lo, en.hi)))
            .map(|en| en.index)
    }

    /// Whether `x` lies in the mesh box enlarged by `margin` of its diagonal.
    pub fn in_domain(&self, x: [f64; 3], margin: f64) -> bool {
        !self.is_empty() && inside_box(x, self.lo, self.hi, margin * diagonal(self.lo, self.hi))
    }

    /// Element index with the centroid nearest to `x`; first wins on ties.
    pub fn nearest_by_centroid(&self, x: [f64; 3]) -> Option<usize> {
        self.entries
            .iter()
            .map(|en| {
                let d = sub(en.centroid, x);
                (en.index, dot(d, d))
            })
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            })
            .map(|(i, _)| i)
    }
}

/// Old integration point chosen as the source for a new one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SourcePoint {
    pub element: EntityId,
    pub ip: IpRef,
    pub status: StatusHandle,
    /// Found by the nearest-centroid fallback rather than containment.
    pub fallback: bool,
}

/// Source search over an old mesh.
#[derive(Debug)]
pub struct AdaptiveMapper<'a> {
    old: &'a Mesh,
    locator: SpatialLocator,
    config: MappingConfig,
}

impl<'a> AdaptiveMapper<'a> {
    pub fn new(old: &'a Mesh, config: MappingConfig) -> Result<Self, GeometryError> {
        let locator = SpatialLocator::build(old)?;
        debug!(
            "adaptive mapper over {} old elements on rank {}",
            locator.len(),
            old.rank()
        );
        Ok(Self {
            old,
            locator,
            config,
        })
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn old_mesh(&self) -> &'a Mesh {
        self.old
    }

    pub fn locator(&self) -> &SpatialLocator {
        &self.locator
    }

    /// Source point for the physical location `x`, or `None` when no
    /// plausible old element exists.
    pub fn locate(&self, x: [f64; 3]) -> Result<Option<SourcePoint>, GeometryError> {
        let domain = self.old.domain();
        let tol = self.config.containment_tolerance;
        for index in self.locator.candidates(x, tol) {
            let e = &self.old.elements()[index];
            let (_, inside) = e.compute_local_coordinates(domain, x, tol)?;
            if inside {
                return self.nearest_point(e, x, false);
            }
        }
        if self.config.allow_nearest_fallback && self.locator.in_domain(x, self.config.domain_margin)
        {
            if let Some(index) = self.locator.nearest_by_centroid(x) {
                let e = &self.old.elements()[index];
                warn!(
                    "no old element contains {x:?}; falling back to element {}",
                    e.number()
                );
                return self.nearest_point(e, x, true);
            }
        }
        Ok(None)
    }

    fn nearest_point(
        &self,
        e: &ElementEntity,
        x: [f64; 3],
        fallback: bool,
    ) -> Result<Option<SourcePoint>, GeometryError> {
        let domain = self.old.domain();
        let mut best: Option<(f64, SourcePoint)> = None;
        for (ip, gp) in IpTraversal::new(e.rules()).iter() {
            let Some(status) = gp.status() else { continue };
            let d = e.ip_distance(domain, ip, x)?;
            if best.as_ref().is_none_or(|(bd, _)| d < *bd) {
                best = Some((
                    d,
                    SourcePoint {
                        element: e.number(),
                        ip,
                        status,
                        fallback,
                    },
                ));
            }
        }
        Ok(best.map(|(_, sp)| sp))
    }

    /// Copy of the old state behind `source`.
    pub fn source_status(&self, source: &SourcePoint) -> Result<MaterialStatus, GeometryError> {
        self.old.domain().statuses().snapshot(source.status)
    }
}

/// Totals of one adaptive cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdaptiveReport {
    pub elements: usize,
    pub mapped_points: usize,
    pub fallback_points: usize,
    pub unmapped_points: usize,
    /// Elements left with at least one point without a source.
    pub failed_elements: Vec<EntityId>,
}

/// Map, commit and finish every element of `new_mesh` from `mapper`'s old
/// mesh.
///
/// Elements with unmapped points keep their previous state and are listed in
/// the report. After a fatal error no further element is mapped, but every
/// element is still finished before the error is returned.
pub fn adaptive_cycle(
    new_mesh: &mut Mesh,
    mapper: &AdaptiveMapper<'_>,
    step: &TimeStep,
) -> Result<AdaptiveReport, GeometryError> {
    let (domain, elements) = new_mesh.parts_mut();
    let mut report = AdaptiveReport::default();
    let mut fatal = None;
    for e in elements.iter_mut() {
        if fatal.is_none() {
            report.elements += 1;
            match e.adaptive_map(domain, mapper, step) {
                Ok(MappingOutcome::Mapped { points, fallbacks }) => {
                    report.mapped_points += points;
                    report.fallback_points += fallbacks;
                    if let Err(err) = e.adaptive_update(domain, step) {
                        fatal = Some(err);
                    }
                }
                Ok(MappingOutcome::NoSource { mapped, unmapped }) => {
                    report.mapped_points += mapped;
                    report.unmapped_points += unmapped;
                    report.failed_elements.push(e.number());
                }
                Err(err) => fatal = Some(err),
            }
        }
        e.adaptive_finish();
    }
    match fatal {
        Some(err) => Err(err),
        None => {
            debug!(
                "adaptive cycle: {} elements, {} points mapped ({} by fallback), {} unmapped",
                report.elements,
                report.mapped_points,
                report.fallback_points,
                report.unmapped_points
            );
            Ok(report)
        }
    }
}
