//! Domain-level registries resolved by element references.

use crate::data::dof::DofManager;
use crate::data::time::TimeFunction;
use crate::geometry_error::GeometryError;
use crate::material::{CrossSection, Material, StatusStore};
use crate::topology::entity_id::EntityId;
use hashbrown::HashMap;

/// Registries an element resolves its references against: dof managers by
/// id, materials, cross sections and time functions by 1-based index, and
/// the store owning every integration point's material status.
#[derive(Default)]
pub struct Domain {
    number: usize,
    dof_managers: HashMap<EntityId, DofManager>,
    materials: Vec<Box<dyn Material>>,
    cross_sections: Vec<Box<dyn CrossSection>>,
    time_functions: Vec<Box<dyn TimeFunction>>,
    statuses: StatusStore,
}

impl Domain {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Register a dof manager under its own number, replacing any previous one.
    pub fn add_dof_manager(&mut self, dm: DofManager) -> Option<DofManager> {
        self.dof_managers.insert(dm.number(), dm)
    }

    pub fn dof_manager(&self, id: EntityId) -> Option<&DofManager> {
        self.dof_managers.get(&id)
    }

    pub fn dof_manager_mut(&mut self, id: EntityId) -> Option<&mut DofManager> {
        self.dof_managers.get_mut(&id)
    }

    pub fn dof_managers(&self) -> impl Iterator<Item = &DofManager> {
        self.dof_managers.values()
    }

    pub fn number_of_dof_managers(&self) -> usize {
        self.dof_managers.len()
    }

    /// Re-key every dof manager through `f`; all-or-nothing.
    pub(crate) fn renumber_dof_managers(
        &mut self,
        mut f: impl FnMut(EntityId) -> Option<EntityId>,
    ) -> Result<(), GeometryError> {
        let mut remapped = HashMap::with_capacity(self.dof_managers.len());
        for (&old, _) in self.dof_managers.iter() {
            let new = f(old).ok_or_else(|| {
                GeometryError::InvalidPermutation(format!("dof manager {old} left unmapped"))
            })?;
            if remapped.insert(new, old).is_some() {
                return Err(GeometryError::InvalidPermutation(format!(
                    "two dof managers map onto {new}"
                )));
            }
        }
        let mut old_map = std::mem::take(&mut self.dof_managers);
        for (new, old) in remapped {
            if let Some(mut dm) = old_map.remove(&old) {
                dm.set_number(new);
                self.dof_managers.insert(new, dm);
            }
        }
        Ok(())
    }

    /// Register a material; returns its 1-based index.
    pub fn add_material(&mut self, m: impl Material + 'static) -> usize {
        self.materials.push(Box::new(m));
        self.materials.len()
    }

    pub fn material(&self, index: usize) -> Result<&dyn Material, GeometryError> {
        index
            .checked_sub(1)
            .and_then(|i| self.materials.get(i))
            .map(|b| b.as_ref())
            .ok_or(GeometryError::UnknownMaterial(index))
    }

    /// Register a cross section; returns its 1-based index.
    pub fn add_cross_section(&mut self, cs: impl CrossSection + 'static) -> usize {
        self.cross_sections.push(Box::new(cs));
        self.cross_sections.len()
    }

    pub fn cross_section(&self, index: usize) -> Result<&dyn CrossSection, GeometryError> {
        index
            .checked_sub(1)
            .and_then(|i| self.cross_sections.get(i))
            .map(|b| b.as_ref())
            .ok_or(GeometryError::UnknownCrossSection(index))
    }

    /// Register a time function; returns its 1-based index.
    pub fn add_time_function(&mut self, f: impl TimeFunction + 'static) -> usize {
        self.time_functions.push(Box::new(f));
        self.time_functions.len()
    }

    pub fn time_function(&self, index: usize) -> Result<&dyn TimeFunction, GeometryError> {
        index
            .checked_sub(1)
            .and_then(|i| self.time_functions.get(i))
            .map(|b| b.as_ref())
            .ok_or(GeometryError::UnknownTimeFunction(index))
    }

    pub fn statuses(&self) -> &StatusStore {
        &self.statuses
    }

    pub fn statuses_mut(&mut self) -> &mut StatusStore {
        &mut self.statuses
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("number", &self.number)
            .field("dof_managers", &self.dof_managers.len())
            .field("materials", &self.materials.len())
            .field("cross_sections", &self.cross_sections.len())
            .field("time_functions", &self.time_functions.len())
            .field("statuses", &self.statuses.len())
            .finish()
    }
}
