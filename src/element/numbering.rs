//! Renumbering of the entity references an element stores.

use super::ElementEntity;
use crate::geometry_error::GeometryError;
use crate::topology::entity_id::EntityId;
use crate::topology::ownership::PartitionList;

/// Kind of reference being renumbered.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RenumberTarget {
    /// A dof-manager number.
    DofManager,
    /// The element's global number.
    GlobalElement,
    /// A partition rank.
    Partition,
}

impl RenumberTarget {
    fn as_str(self) -> &'static str {
        match self {
            RenumberTarget::DofManager => "dof manager",
            RenumberTarget::GlobalElement => "global number",
            RenumberTarget::Partition => "partition",
        }
    }
}

/// Old-to-new number mapping; `None` means "no image", which aborts the
/// renumbering of the element.
pub trait EntityRenumbering {
    fn renumber(&self, old: u64, target: RenumberTarget) -> Option<u64>;
}

impl<F> EntityRenumbering for F
where
    F: Fn(u64, RenumberTarget) -> Option<u64>,
{
    fn renumber(&self, old: u64, target: RenumberTarget) -> Option<u64> {
        self(old, target)
    }
}

/// Maps every number onto itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct IdentityRenumbering;

impl EntityRenumbering for IdentityRenumbering {
    fn renumber(&self, old: u64, _target: RenumberTarget) -> Option<u64> {
        Some(old)
    }
}

/// Renumbered references of one element, computed before any is applied.
pub(crate) struct RenumberPlan {
    dof_managers: Vec<EntityId>,
    global_number: u64,
    partitions: PartitionList,
}

impl RenumberPlan {
    pub(crate) fn global_number(&self) -> u64 {
        self.global_number
    }
}

impl ElementEntity {
    /// Remap dof-manager numbers, the global number and partition ranks.
    /// Either every reference is remapped or the element is left unchanged.
    pub fn update_local_numbering<R>(&mut self, renumbering: &R) -> Result<(), GeometryError>
    where
        R: EntityRenumbering + ?Sized,
    {
        let plan = self.plan_renumbering(renumbering)?;
        self.apply_renumbering(plan);
        Ok(())
    }

    pub(crate) fn apply_renumbering(&mut self, plan: RenumberPlan) {
        self.dof_managers = plan.dof_managers;
        self.global_number = plan.global_number;
        self.partitions = plan.partitions;
    }

    pub(crate) fn plan_renumbering<R>(&self, r: &R) -> Result<RenumberPlan, GeometryError>
    where
        R: EntityRenumbering + ?Sized,
    {
        let map = |old: u64, target: RenumberTarget| {
            r.renumber(old, target)
                .ok_or(GeometryError::RenumberingFailed {
                    element: self.number,
                    what: target.as_str(),
                    old,
                })
        };
        let dof_managers = self
            .dof_managers
            .iter()
            .map(|dm| {
                let new = map(dm.get(), RenumberTarget::DofManager)?;
                EntityId::new(new).map_err(|_| GeometryError::RenumberingFailed {
                    element: self.number,
                    what: RenumberTarget::DofManager.as_str(),
                    old: dm.get(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let global_number = map(self.global_number, RenumberTarget::GlobalElement)?;
        let partitions = self
            .partitions
            .iter()
            .map(|rank| {
                let new = map(rank as u64, RenumberTarget::Partition)?;
                usize::try_from(new).map_err(|_| GeometryError::RenumberingFailed {
                    element: self.number,
                    what: RenumberTarget::Partition.as_str(),
                    old: rank as u64,
                })
            })
            .collect::<Result<PartitionList, _>>()?;
        Ok(RenumberPlan {
            dof_managers,
            global_number,
            partitions,
        })
    }
}
