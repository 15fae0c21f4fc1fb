//! Integration rules and the per-element arena that owns them.

use super::gauss_point::GaussPoint;
use crate::geometry::quadrature::IntegrationDomain;
use crate::geometry_error::GeometryError;
use crate::material::{MaterialMode, StatusHandle};

/// Ordered set of integration points realizing one quadrature scheme.
///
/// Point order is fixed once set up; exchange and persistence address points
/// by position.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationRule {
    number: usize,
    domain: IntegrationDomain,
    mode: MaterialMode,
    points: Vec<GaussPoint>,
}

impl IntegrationRule {
    /// Empty rule; points are added by [`set_up_integration_points`](Self::set_up_integration_points).
    pub fn new(number: usize, domain: IntegrationDomain, mode: MaterialMode) -> Self {
        Self {
            number,
            domain,
            mode,
            points: Vec::new(),
        }
    }

    /// Populate `nip` points from the quadrature tables of the rule's domain.
    /// Existing points are replaced; returns the new point count.
    pub fn set_up_integration_points(&mut self, nip: usize) -> Result<usize, GeometryError> {
        let qps = self.domain.points(nip)?;
        self.points = qps
            .into_iter()
            .enumerate()
            .map(|(i, qp)| GaussPoint::new(i + 1, qp.coords, qp.weight, self.mode))
            .collect();
        Ok(self.points.len())
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn domain(&self) -> IntegrationDomain {
        self.domain
    }

    pub fn material_mode(&self) -> MaterialMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<&GaussPoint> {
        self.points.get(i)
    }

    pub fn point_mut(&mut self, i: usize) -> Option<&mut GaussPoint> {
        self.points.get_mut(i)
    }

    pub fn points(&self) -> &[GaussPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [GaussPoint] {
        &mut self.points
    }

    /// Detach and return every status handle held by the points.
    pub fn take_statuses(&mut self) -> Vec<StatusHandle> {
        self.points
            .iter_mut()
            .filter_map(GaussPoint::take_status)
            .collect()
    }
}

/// Handle of a rule inside a [`RuleArena`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    pub fn new(index: usize) -> Self {
        RuleId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of an element's rules, addressed by [`RuleId`] in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleArena {
    rules: Vec<IntegrationRule>,
}

impl RuleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: IntegrationRule) -> RuleId {
        self.rules.push(rule);
        RuleId::new(self.rules.len() - 1)
    }

    pub fn get(&self, id: RuleId) -> Option<&IntegrationRule> {
        self.rules.get(id.index())
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut IntegrationRule> {
        self.rules.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total point count over all rules.
    pub fn point_count(&self) -> usize {
        self.rules.iter().map(IntegrationRule::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &IntegrationRule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| (RuleId::new(i), r))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RuleId, &mut IntegrationRule)> {
        self.rules
            .iter_mut()
            .enumerate()
            .map(|(i, r)| (RuleId::new(i), r))
    }

    /// Remove all rules, returning the status handles they held.
    pub fn clear(&mut self) -> Vec<StatusHandle> {
        let handles = self
            .rules
            .iter_mut()
            .flat_map(IntegrationRule::take_statuses)
            .collect();
        self.rules.clear();
        handles
    }

    /// Replace all rules, returning the status handles of the old ones.
    pub fn replace(&mut self, rules: Vec<IntegrationRule>) -> Vec<StatusHandle> {
        let handles = self.clear();
        self.rules = rules;
        handles
    }
}
