//! Element side of the adaptive state transfer.

use super::{ElementEntity, LifecycleState};
use crate::algs::adapt::AdaptiveMapper;
use crate::data::time::TimeStep;
use crate::geometry_error::GeometryError;
use crate::integration::IpTraversal;
use crate::mesh::Domain;
use log::{debug, warn};

/// Per-element bookkeeping while a mapping is in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MappingScratch {
    pub(crate) mapped: usize,
    pub(crate) fallbacks: usize,
    pub(crate) unmapped: usize,
}

/// Result of [`ElementEntity::adaptive_map`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Every point received a source state.
    Mapped { points: usize, fallbacks: usize },
    /// Some points had no plausible source and kept their own state.
    NoSource { mapped: usize, unmapped: usize },
}

impl MappingOutcome {
    pub fn is_mapped(&self) -> bool {
        matches!(self, MappingOutcome::Mapped { .. })
    }
}

impl ElementEntity {
    /// Copy the state of the old mesh held by `mapper` into the temporary
    /// state of every point of this element.
    ///
    /// A point with no source is a soft failure reported through
    /// [`MappingOutcome::NoSource`]; geometry or status errors are fatal.
    pub fn adaptive_map(
        &mut self,
        domain: &Domain,
        mapper: &AdaptiveMapper<'_>,
        _step: &TimeStep,
    ) -> Result<MappingOutcome, GeometryError> {
        self.require_stepping("adaptive_map")?;
        self.transition(LifecycleState::MappingInProgress);
        let material = domain.material(self.material)?;
        let old_domain = mapper.old_mesh().domain();
        let store = domain.statuses();
        let mut scratch = MappingScratch::default();
        for (ip, gp) in IpTraversal::new(&self.rules).iter() {
            let h = self.status_handle(ip, gp)?;
            let x = self.compute_ip_global_coordinates(domain, ip)?;
            let Some(source) = mapper.locate(x)? else {
                scratch.unmapped += 1;
                continue;
            };
            let src = old_domain.statuses().snapshot(source.status)?;
            store.write(h, |t| material.map_status(&src, t))?;
            scratch.mapped += 1;
            if source.fallback {
                scratch.fallbacks += 1;
            }
        }
        let outcome = if scratch.unmapped == 0 {
            MappingOutcome::Mapped {
                points: scratch.mapped,
                fallbacks: scratch.fallbacks,
            }
        } else {
            warn!(
                "element {}: {} of {} points have no source in the old mesh",
                self.number,
                scratch.unmapped,
                scratch.mapped + scratch.unmapped
            );
            MappingOutcome::NoSource {
                mapped: scratch.mapped,
                unmapped: scratch.unmapped,
            }
        };
        self.mapping = Some(scratch);
        Ok(outcome)
    }

    /// Commit the mapped state into the equilibrium history.
    pub fn adaptive_update(&self, domain: &Domain, step: &TimeStep) -> Result<(), GeometryError> {
        self.require_state("adaptive_update", &[LifecycleState::MappingInProgress])?;
        let material = domain.material(self.material)?;
        let store = domain.statuses();
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            store.write(h, |s| material.update_status(s, step))
        })
    }

    /// Drop mapping bookkeeping and resume stepping. Safe to call on an
    /// element whose mapping failed or never started; elements without rules
    /// stay where they are.
    pub fn adaptive_finish(&mut self) {
        if let Some(scratch) = self.mapping.take() {
            debug!(
                "element {}: mapping finished ({} mapped, {} unmapped)",
                self.number, scratch.mapped, scratch.unmapped
            );
        }
        if matches!(
            self.state,
            LifecycleState::Created | LifecycleState::DofManagersAttached
        ) {
            return;
        }
        self.transition(LifecycleState::MappingFinished);
    }

    /// Whether a mapping is in progress on this element.
    pub fn is_mapping(&self) -> bool {
        self.state == LifecycleState::MappingInProgress
    }
}
