//! Element lifecycle and the per-step hooks.
//!
//! ```text
//! Created -> DofManagersAttached -> RulesBuilt <-> step loop
//!                                      |
//!                          adaptive_map v
//!                            MappingInProgress -> MappingFinished -> step loop
//! ```

use super::ElementEntity;
use crate::data::time::TimeStep;
use crate::geometry_error::GeometryError;
use crate::integration::IpTraversal;
use crate::mesh::Domain;

/// Position of an element in its lifecycle.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum LifecycleState {
    #[default]
    Created,
    DofManagersAttached,
    RulesBuilt,
    MappingInProgress,
    MappingFinished,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::DofManagersAttached => "dof-managers-attached",
            LifecycleState::RulesBuilt => "rules-built",
            LifecycleState::MappingInProgress => "mapping-in-progress",
            LifecycleState::MappingFinished => "mapping-finished",
        }
    }

    /// Ordinary step hooks and partition exchange are allowed.
    pub fn is_stepping(self) -> bool {
        matches!(
            self,
            LifecycleState::RulesBuilt | LifecycleState::MappingFinished
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ElementEntity {
    /// Reset every point's trial state before the step's equations are solved.
    pub fn init_for_new_step(&mut self, domain: &Domain) -> Result<(), GeometryError> {
        self.require_stepping("init_for_new_step")?;
        let material = domain.material(self.material)?;
        let store = domain.statuses();
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            store.write(h, |s| material.init_temp_status(s))
        })?;
        self.transition(LifecycleState::RulesBuilt);
        Ok(())
    }

    /// Commit every point's trial state after a converged step.
    ///
    /// Must run exactly once per converged step; history variables are path
    /// dependent.
    pub fn update_yourself(&self, domain: &Domain, step: &TimeStep) -> Result<(), GeometryError> {
        self.require_stepping("update_yourself")?;
        let material = domain.material(self.material)?;
        let store = domain.statuses();
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            store.write(h, |s| material.update_status(s, step))
        })
    }

    /// Hook for element-level state beyond the material points; nothing to
    /// do for the current kinds.
    pub fn update_internal_state(
        &self,
        _domain: &Domain,
        _step: &TimeStep,
    ) -> Result<(), GeometryError> {
        self.require_stepping("update_internal_state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dof::DofManager;
    use crate::data::record::{InputRecord, RecordValue, keys};
    use crate::material::{LinearElasticMaterial, SimpleCrossSection};
    use crate::topology::element_kind::ElementKind;
    use crate::topology::entity_id::EntityId;

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn setup() -> (Domain, ElementEntity) {
        let mut d = Domain::new(1);
        d.add_dof_manager(DofManager::node(id(1), [0.0; 3]));
        d.add_dof_manager(DofManager::node(id(2), [2.0, 0.0, 0.0]));
        d.add_material(LinearElasticMaterial::new(1.0, 0.0).with_history_size(1));
        d.add_cross_section(SimpleCrossSection::default());
        let mut e = ElementEntity::new(id(1), ElementKind::Truss1d);
        e.initialize_from(
            &InputRecord::new("truss1d", 1)
                .with(keys::MATERIAL, RecordValue::Int(1))
                .with(keys::CROSS_SECTION, RecordValue::Int(1))
                .with(keys::NODES, RecordValue::IntList(vec![1, 2]))
                .with(keys::NIP, RecordValue::Int(2)),
        )
        .unwrap();
        (d, e)
    }

    #[test]
    fn hooks_require_rules() {
        let (d, mut e) = setup();
        let step = TimeStep::new(1, 1.0, 1.0);
        assert!(matches!(
            e.update_yourself(&d, &step),
            Err(GeometryError::InvalidLifecycle { state: "dof-managers-attached", .. })
        ));
        assert!(e.init_for_new_step(&d).is_err());
    }

    #[test]
    fn commit_then_reset_cycle() {
        let (mut d, mut e) = setup();
        e.post_initialize(&mut d).unwrap();
        let step = TimeStep::new(1, 1.0, 1.0);
        let handles: Vec<_> = IpTraversal::new(e.rules())
            .iter()
            .filter_map(|(_, gp)| gp.status())
            .collect();
        for (k, h) in handles.iter().enumerate() {
            d.statuses()
                .write(*h, |s| s.set_temp_history(&[k as f64 + 1.0]))
                .unwrap();
        }
        e.update_yourself(&d, &step).unwrap();
        e.init_for_new_step(&d).unwrap();
        for (k, h) in handles.iter().enumerate() {
            let s = d.statuses().snapshot(*h).unwrap();
            assert_eq!(s.history(), &[k as f64 + 1.0]);
            assert_eq!(s.temp_history(), s.history());
        }
    }
}
