//! A partition's mesh: the domain registries plus its elements.

pub mod domain;

pub use domain::Domain;

use crate::data::time::TimeStep;
use crate::debug_invariants::DebugInvariants;
use crate::element::ElementEntity;
use crate::geometry_error::GeometryError;
use crate::topology::entity_id::EntityId;
use std::collections::{BTreeSet, HashSet};

/// Elements of one partition, kept sorted by local number, with the domain
/// they reference.
#[derive(Debug, Default)]
pub struct Mesh {
    domain: Domain,
    elements: Vec<ElementEntity>,
    rank: usize,
}

impl Mesh {
    pub fn new(domain: Domain, rank: usize) -> Self {
        Self {
            domain,
            elements: Vec::new(),
            rank,
        }
    }

    /// Partition rank this mesh lives on.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub(crate) fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut Domain {
        &mut self.domain
    }

    pub fn elements(&self) -> &[ElementEntity] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [ElementEntity] {
        &mut self.elements
    }

    /// Shared domain plus exclusive elements, for per-element mutation.
    pub fn parts_mut(&mut self) -> (&Domain, &mut [ElementEntity]) {
        (&self.domain, &mut self.elements)
    }

    /// Exclusive domain and elements, for status allocation and renumbering.
    pub fn split_mut(&mut self) -> (&mut Domain, &mut [ElementEntity]) {
        (&mut self.domain, &mut self.elements)
    }

    pub fn add_element(&mut self, element: ElementEntity) -> Result<(), GeometryError> {
        match self
            .elements
            .binary_search_by_key(&element.number(), ElementEntity::number)
        {
            Ok(_) => Err(GeometryError::DuplicateElement(element.number())),
            Err(pos) => {
                self.elements.insert(pos, element);
                Ok(())
            }
        }
    }

    pub fn number_of_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, number: EntityId) -> Option<&ElementEntity> {
        self.position(number).map(|i| &self.elements[i])
    }

    pub fn element_mut(&mut self, number: EntityId) -> Option<&mut ElementEntity> {
        self.position(number).map(move |i| &mut self.elements[i])
    }

    fn position(&self, number: EntityId) -> Option<usize> {
        self.elements
            .binary_search_by_key(&number, ElementEntity::number)
            .ok()
    }

    pub fn element_by_global(&self, global: u64) -> Option<&ElementEntity> {
        self.elements.iter().find(|e| e.global_number() == global)
    }

    /// Build integration rules and material state for every element.
    pub fn post_initialize(&mut self) -> Result<(), GeometryError> {
        let (domain, elements) = self.split_mut();
        for e in elements.iter_mut() {
            e.post_initialize(domain)?;
        }
        self.debug_assert_invariants();
        Ok(())
    }

    /// Consistency of every element; all failures are logged.
    pub fn check_consistency(&self) -> bool {
        self.elements
            .iter()
            .fold(true, |ok, e| e.check_consistency(&self.domain) && ok)
    }

    /// Reset trial state of every local element.
    pub fn init_for_new_step(&mut self) -> Result<(), GeometryError> {
        let (domain, elements) = self.parts_mut();
        elements
            .iter_mut()
            .filter(|e| e.parallel_mode().is_local())
            .try_for_each(|e| e.init_for_new_step(domain))
    }

    /// Commit the converged step on every local element. Remote mirrors are
    /// refreshed by partition exchange only.
    pub fn update_yourself(&self, step: &TimeStep) -> Result<(), GeometryError> {
        #[cfg(feature = "rayon")]
        let result = {
            use rayon::prelude::*;
            self.elements
                .par_iter()
                .filter(|e| e.parallel_mode().is_local())
                .try_for_each(|e| e.update_yourself(&self.domain, step))
        };
        #[cfg(not(feature = "rayon"))]
        let result = self
            .elements
            .iter()
            .filter(|e| e.parallel_mode().is_local())
            .try_for_each(|e| e.update_yourself(&self.domain, step));
        result
    }

    /// Local elements active at `step`.
    pub fn active_local_elements(
        &self,
        step: &TimeStep,
    ) -> Result<Vec<&ElementEntity>, GeometryError> {
        let mut out = Vec::new();
        for e in self.elements.iter().filter(|e| e.parallel_mode().is_local()) {
            if e.is_activated(&self.domain, step)? {
                out.push(e);
            }
        }
        Ok(out)
    }

    /// Ranks sharing at least one element with this partition.
    pub fn neighbour_ranks(&self) -> BTreeSet<usize> {
        self.elements
            .iter()
            .flat_map(|e| e.partitions().peers(self.rank))
            .collect()
    }
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<(), GeometryError> {
        if let Some(w) = self
            .elements
            .windows(2)
            .find(|w| w[0].number() >= w[1].number())
        {
            return Err(GeometryError::DuplicateElement(w[1].number()));
        }
        let mut globals = HashSet::with_capacity(self.elements.len());
        for e in &self.elements {
            if !globals.insert(e.global_number()) {
                return Err(GeometryError::InvalidPermutation(format!(
                    "global number {} used twice",
                    e.global_number()
                )));
            }
            for &dm in e.dof_managers() {
                if self.domain.dof_manager(dm).is_none() {
                    return Err(GeometryError::UnknownDofManager {
                        element: e.number(),
                        dof_manager: dm,
                    });
                }
            }
            if !e.partitions().is_empty() && !e.partitions().contains(self.rank) {
                return Err(GeometryError::InvalidGeometry(format!(
                    "element {} shared by {:?} but held by rank {}",
                    e.number(),
                    e.partitions().as_slice(),
                    self.rank
                )));
            }
            if e.parallel_mode().is_remote() && e.partitions().len() < 2 {
                return Err(GeometryError::InvalidGeometry(format!(
                    "remote element {} has no owning peer",
                    e.number()
                )));
            }
        }
        Ok(())
    }
}
