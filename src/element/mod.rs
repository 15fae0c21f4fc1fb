//! The per-element aggregate: references into the domain, owned integration
//! rules, and the parallel-ownership metadata.
//!
//! Operations are grouped by concern:
//! - construction, accessors and dof bookkeeping (this file),
//! - step hooks and the lifecycle state machine ([`lifecycle`]),
//! - volume and coordinate queries ([`geometry_ops`]),
//! - persisted context ([`context`]),
//! - renumbering ([`numbering`]),
//! - partition exchange ([`sync`]),
//! - adaptive state mapping ([`adapt`]).

pub mod adapt;
pub mod context;
pub mod geometry_ops;
pub mod lifecycle;
pub mod numbering;
pub mod sync;

pub use adapt::MappingOutcome;
pub use lifecycle::LifecycleState;
pub use numbering::{EntityRenumbering, IdentityRenumbering, RenumberTarget};

use crate::data::dof::{DofId, DofManager, EquationKind};
use crate::data::record::{InputRecord, RecordValue, keys};
use crate::data::time::TimeStep;
use crate::geometry::interpolation::{cross, normalize};
use crate::geometry::quadrature::IntegrationDomain;
use crate::geometry_error::GeometryError;
use crate::integration::{
    GaussPoint, IntegrationRule, IpRef, IpTraversal, RuleArena, RuleId, for_each_ip_mut,
};
use crate::material::{InternalStateType, MaterialMode, StatusHandle};
use crate::mesh::Domain;
use crate::topology::element_kind::{ElementGeometry, ElementKind};
use crate::topology::entity_id::EntityId;
use crate::topology::ownership::{ParallelMode, PartitionList};
use adapt::MappingScratch;
use log::{debug, warn};
use std::io::Write;

/// One finite element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementEntity {
    number: EntityId,
    global_number: u64,
    kind: ElementKind,
    dof_managers: Vec<EntityId>,
    material: usize,
    cross_section: usize,
    activity_time_function: Option<usize>,
    local_cs: Option<[[f64; 3]; 3]>,
    nip: Option<usize>,
    rules: RuleArena,
    parallel_mode: ParallelMode,
    partitions: PartitionList,
    state: LifecycleState,
    mapping: Option<MappingScratch>,
}

impl ElementEntity {
    /// A bare element; its global number starts equal to the local one.
    pub fn new(number: EntityId, kind: ElementKind) -> Self {
        Self {
            number,
            global_number: number.get(),
            kind,
            dof_managers: Vec::new(),
            material: 0,
            cross_section: 0,
            activity_time_function: None,
            local_cs: None,
            nip: None,
            rules: RuleArena::new(),
            parallel_mode: ParallelMode::Local,
            partitions: PartitionList::new(),
            state: LifecycleState::Created,
            mapping: None,
        }
    }

    /// Read `mat`, `crosssect`, `nodes`, and optionally `lcs`, `nip`,
    /// `activityltf`. Other keys are ignored.
    pub fn initialize_from(&mut self, ir: &InputRecord) -> Result<(), GeometryError> {
        self.require_state(
            "initialize_from",
            &[LifecycleState::Created, LifecycleState::DofManagersAttached],
        )?;
        let material = ir.required_index(keys::MATERIAL)?;
        let cross_section = ir.required_index(keys::CROSS_SECTION)?;
        let nodes = ir
            .required_int_list(keys::NODES)?
            .iter()
            .map(|&n| {
                u64::try_from(n)
                    .ok()
                    .and_then(|n| EntityId::new(n).ok())
                    .ok_or_else(|| GeometryError::MalformedRecord {
                        key: keys::NODES,
                        reason: format!("invalid dof manager number {n}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let local_cs = ir
            .optional_real_list(keys::LOCAL_CS)?
            .map(|v| local_cs_from_rows(&v))
            .transpose()?;
        let nip = ir.optional_index(keys::NIP)?.filter(|&n| n > 0);
        let activity = ir.optional_index(keys::ACTIVITY_LTF)?.filter(|&n| n > 0);

        self.check_dof_manager_count(nodes.len())?;
        self.material = material;
        self.cross_section = cross_section;
        self.dof_managers = nodes;
        self.local_cs = local_cs;
        self.nip = nip;
        self.activity_time_function = activity;
        self.transition(LifecycleState::DofManagersAttached);
        Ok(())
    }

    /// Record with exactly the keys [`ElementEntity::initialize_from`] consumes.
    pub fn give_input_record(&self) -> InputRecord {
        let mut ir = InputRecord::new(self.kind.name(), self.number.get());
        ir.set(keys::MATERIAL, RecordValue::Int(self.material as i64));
        ir.set(keys::CROSS_SECTION, RecordValue::Int(self.cross_section as i64));
        ir.set(
            keys::NODES,
            RecordValue::IntList(self.dof_managers.iter().map(|d| d.get() as i64).collect()),
        );
        if let Some(lcs) = &self.local_cs {
            let rows: Vec<f64> = lcs[0].iter().chain(lcs[1].iter()).copied().collect();
            ir.set(keys::LOCAL_CS, RecordValue::RealList(rows));
        }
        if let Some(nip) = self.nip {
            ir.set(keys::NIP, RecordValue::Int(nip as i64));
        }
        if let Some(ltf) = self.activity_time_function {
            ir.set(keys::ACTIVITY_LTF, RecordValue::Int(ltf as i64));
        }
        ir
    }

    /// Build the integration rules through the kind's rule factory and
    /// allocate one material status per point.
    pub fn post_initialize(&mut self, domain: &mut Domain) -> Result<(), GeometryError> {
        self.require_state("post_initialize", &[LifecycleState::DofManagersAttached])?;
        self.node_coordinates(domain)?;
        let rules = self.kind.build_rules(self.nip)?;
        for h in self.rules.replace(rules) {
            domain.statuses_mut().release(h)?;
        }
        self.attach_statuses(domain)?;
        self.transition(LifecycleState::RulesBuilt);
        Ok(())
    }

    /// Allocate statuses for every point lacking one.
    fn attach_statuses(&mut self, domain: &mut Domain) -> Result<(), GeometryError> {
        let fresh: Vec<_> = {
            let material = domain.material(self.material)?;
            IpTraversal::new(&self.rules)
                .iter()
                .filter(|(_, gp)| gp.status().is_none())
                .map(|(_, gp)| material.create_status(gp.material_mode()))
                .collect()
        };
        let store = domain.statuses_mut();
        let mut fresh = fresh.into_iter();
        for_each_ip_mut(&mut self.rules, |_, gp| {
            if gp.status().is_some() {
                return;
            }
            if let Some(s) = fresh.next() {
                gp.set_status(store.allocate(s));
            }
        });
        Ok(())
    }

    /// Replace the dof-manager list. Rules are dropped (the geometry they
    /// were built on is gone); the orphaned status handles are returned for
    /// the caller to release.
    pub fn set_dof_managers(
        &mut self,
        dof_managers: Vec<EntityId>,
    ) -> Result<Vec<StatusHandle>, GeometryError> {
        self.require_not_mapping("set_dof_managers")?;
        self.check_dof_manager_count(dof_managers.len())?;
        self.dof_managers = dof_managers;
        let orphans = self.rules.clear();
        self.transition(LifecycleState::DofManagersAttached);
        Ok(orphans)
    }

    /// Replace the integration rules. Points without a status get one on
    /// the next [`ElementEntity::attach_material_statuses`]; handles held by
    /// the old rules are returned.
    pub fn set_integration_rules(
        &mut self,
        rules: Vec<IntegrationRule>,
    ) -> Result<Vec<StatusHandle>, GeometryError> {
        self.require_not_mapping("set_integration_rules")?;
        if self.state == LifecycleState::Created {
            return Err(self.lifecycle_error("set_integration_rules"));
        }
        let orphans = self.rules.replace(rules);
        self.transition(LifecycleState::RulesBuilt);
        Ok(orphans)
    }

    /// Give every point without material state a fresh status.
    pub fn attach_material_statuses(&mut self, domain: &mut Domain) -> Result<(), GeometryError> {
        self.attach_statuses(domain)
    }

    fn check_dof_manager_count(&self, found: usize) -> Result<(), GeometryError> {
        let expected = self.kind.number_of_dof_managers();
        if found != expected {
            return Err(GeometryError::DofManagerCountMismatch {
                element: self.number,
                expected,
                found,
            });
        }
        Ok(())
    }

    // ----- accessors -------------------------------------------------------

    pub fn number(&self) -> EntityId {
        self.number
    }

    pub fn global_number(&self) -> u64 {
        self.global_number
    }

    pub fn set_global_number(&mut self, global: u64) {
        self.global_number = global;
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn dof_managers(&self) -> &[EntityId] {
        &self.dof_managers
    }

    pub fn number_of_dof_managers(&self) -> usize {
        self.dof_managers.len()
    }

    /// Dof managers acting as geometry nodes (all of them for current kinds).
    pub fn number_of_nodes(&self) -> usize {
        self.kind.number_of_dof_managers()
    }

    /// Dof manager at 1-based local position `i`.
    pub fn give_dof_manager<'d>(
        &self,
        i: usize,
        domain: &'d Domain,
    ) -> Result<&'d DofManager, GeometryError> {
        let id = self.local_dof_manager(i)?;
        domain
            .dof_manager(id)
            .ok_or(GeometryError::UnknownDofManager {
                element: self.number,
                dof_manager: id,
            })
    }

    fn local_dof_manager(&self, i: usize) -> Result<EntityId, GeometryError> {
        i.checked_sub(1)
            .and_then(|k| self.dof_managers.get(k))
            .copied()
            .ok_or(GeometryError::LocalIndexOutOfRange {
                element: self.number,
                index: i,
                count: self.dof_managers.len(),
            })
    }

    pub fn material(&self) -> usize {
        self.material
    }

    pub fn set_material(&mut self, material: usize) {
        self.material = material;
    }

    pub fn cross_section(&self) -> usize {
        self.cross_section
    }

    pub fn set_cross_section(&mut self, cross_section: usize) {
        self.cross_section = cross_section;
    }

    /// Region the element belongs to; regions are keyed by cross section.
    pub fn region_number(&self) -> usize {
        self.cross_section
    }

    pub fn activity_time_function(&self) -> Option<usize> {
        self.activity_time_function
    }

    pub fn set_activity_time_function(&mut self, ltf: Option<usize>) {
        self.activity_time_function = ltf;
    }

    pub fn rules(&self) -> &RuleArena {
        &self.rules
    }

    /// The first rule, used for ordinary stiffness/state evaluation.
    pub fn default_rule_id(&self) -> Option<RuleId> {
        self.rules.iter().next().map(|(id, _)| id)
    }

    pub fn number_of_integration_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn gauss_point(&self, ip: IpRef) -> Result<&GaussPoint, GeometryError> {
        self.rules
            .get(ip.rule)
            .and_then(|r| r.point(ip.point))
            .ok_or(GeometryError::InvalidIntegrationPoint {
                element: self.number,
                rule: ip.rule.index(),
                index: ip.point,
            })
    }

    pub(crate) fn status_handle(
        &self,
        ip: IpRef,
        gp: &GaussPoint,
    ) -> Result<StatusHandle, GeometryError> {
        gp.status().ok_or(GeometryError::InvalidIntegrationPoint {
            element: self.number,
            rule: ip.rule.index(),
            index: ip.point,
        })
    }

    pub fn spatial_dimension(&self) -> usize {
        self.kind.spatial_dimension()
    }

    pub fn number_of_boundary_sides(&self) -> usize {
        self.kind.number_of_boundary_sides()
    }

    pub fn integration_domain(&self) -> IntegrationDomain {
        self.kind.integration_domain()
    }

    pub fn material_mode(&self) -> MaterialMode {
        self.kind.material_mode()
    }

    /// Rows are the local base vectors; `None` means the global system.
    pub fn give_local_coordinate_system(&self) -> Option<&[[f64; 3]; 3]> {
        self.local_cs.as_ref()
    }

    pub fn parallel_mode(&self) -> ParallelMode {
        self.parallel_mode
    }

    pub fn set_parallel_mode(&mut self, mode: ParallelMode) {
        self.parallel_mode = mode;
    }

    pub fn partitions(&self) -> &PartitionList {
        &self.partitions
    }

    pub fn set_partitions(&mut self, partitions: PartitionList) {
        self.partitions = partitions;
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    // ----- dofs ------------------------------------------------------------

    /// Dofs this element uses at local dof manager `i` (1-based) for `eq`.
    /// Fails if the dof manager does not carry one of them.
    pub fn give_dof_man_dof_id_mask(
        &self,
        domain: &Domain,
        i: usize,
        eq: EquationKind,
    ) -> Result<Vec<DofId>, GeometryError> {
        let dm = self.give_dof_manager(i, domain)?;
        let mask = self.kind.dof_mask(eq);
        if let Some(&dof) = mask.iter().find(|&&d| !dm.has_dof(d)) {
            return Err(GeometryError::MissingDof {
                element: self.number,
                dof_manager: dm.number(),
                dof,
            });
        }
        Ok(mask.to_vec())
    }

    /// Per-node masks concatenated in node order.
    pub fn give_element_dof_id_mask(&self, eq: EquationKind) -> Vec<DofId> {
        let mask = self.kind.dof_mask(eq);
        (0..self.dof_managers.len())
            .flat_map(|_| mask.iter().copied())
            .collect()
    }

    /// Equation numbers of the element's dofs in node-then-mask order;
    /// `None` marks prescribed or unnumbered dofs.
    pub fn give_location_array(
        &self,
        domain: &Domain,
        eq: EquationKind,
    ) -> Result<Vec<Option<usize>>, GeometryError> {
        let mut loc = Vec::with_capacity(self.dof_managers.len() * self.kind.dof_mask(eq).len());
        for i in 1..=self.dof_managers.len() {
            let dm = self.give_dof_manager(i, domain)?;
            for dof in self.give_dof_man_dof_id_mask(domain, i, eq)? {
                loc.push(dm.dof(dof).and_then(|d| d.equation));
            }
        }
        Ok(loc)
    }

    // ----- collaborators ---------------------------------------------------

    /// Whether the material and cross section both support what this kind
    /// needs. Failure is logged; callers treat it as fatal.
    pub fn check_consistency(&self, domain: &Domain) -> bool {
        let required = self.kind.required_capabilities();
        let material = match domain.material(self.material) {
            Ok(m) => m,
            Err(e) => {
                warn!("element {}: {e}", self.number);
                return false;
            }
        };
        let cross_section = match domain.cross_section(self.cross_section) {
            Ok(cs) => cs,
            Err(e) => {
                warn!("element {}: {e}", self.number);
                return false;
            }
        };
        if !material.capabilities().contains(required) {
            warn!(
                "element {} ({}): material {} lacks {:?}",
                self.number,
                self.kind,
                material.name(),
                required
            );
            return false;
        }
        if !cross_section.capabilities().contains(required) {
            warn!(
                "element {} ({}): cross section {} lacks {:?}",
                self.number, self.kind, self.cross_section, required
            );
            return false;
        }
        true
    }

    /// Point value of `kind`. `Ok(None)` means the element/material pair does
    /// not provide that quantity.
    pub fn give_ip_value(
        &self,
        domain: &Domain,
        ip: IpRef,
        kind: InternalStateType,
        _step: &TimeStep,
    ) -> Result<Option<Vec<f64>>, GeometryError> {
        let gp = self.gauss_point(ip)?;
        let Some(h) = gp.status() else {
            return Ok(None);
        };
        let material = domain.material(self.material)?;
        let cross_section = domain.cross_section(self.cross_section)?;
        domain
            .statuses()
            .read(h, |s| cross_section.give_ip_value(material, s, kind, gp.material_mode()))
    }

    /// False exactly when the activity function is zero at the step's
    /// intrinsic time. Elements without one are always active.
    pub fn is_activated(&self, domain: &Domain, step: &TimeStep) -> Result<bool, GeometryError> {
        match self.activity_time_function {
            None => Ok(true),
            Some(ltf) => Ok(domain.time_function(ltf)?.evaluate(step.intrinsic_time) != 0.0),
        }
    }

    // ----- load balancing --------------------------------------------------

    pub fn give_relative_self_computational_cost(&self) -> f64 {
        self.kind.relative_self_cost()
    }

    /// Self cost scaled by the material's per-point cost.
    pub fn predict_relative_computational_cost(&self, domain: &Domain) -> Result<f64, GeometryError> {
        let material = domain.material(self.material)?;
        let cross_section = domain.cross_section(self.cross_section)?;
        Ok(self.give_relative_self_computational_cost()
            * material.relative_computational_cost()
            * cross_section.relative_computational_cost())
    }

    pub fn predict_relative_redistribution_cost(&self) -> f64 {
        1.0
    }

    // ----- output ----------------------------------------------------------

    /// Per-point strain and stress report.
    pub fn print_output_at<W: Write>(
        &self,
        w: &mut W,
        domain: &Domain,
        step: &TimeStep,
    ) -> Result<(), GeometryError> {
        writeln!(
            w,
            "element {} (global {}, {}) step {}:",
            self.number, self.global_number, self.kind, step.number
        )?;
        for (ip, gp) in IpTraversal::new(&self.rules).iter() {
            let strain = self.give_ip_value(domain, ip, InternalStateType::Strain, step)?;
            let stress = self.give_ip_value(domain, ip, InternalStateType::Stress, step)?;
            writeln!(
                w,
                "  GP {}.{} : strains {} stresses {}",
                ip.rule.index() + 1,
                gp.number(),
                format_values(strain.as_deref()),
                format_values(stress.as_deref())
            )?;
        }
        Ok(())
    }

    // ----- lifecycle helpers -----------------------------------------------

    pub(crate) fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            debug!("element {}: {} -> {}", self.number, self.state, next);
            self.state = next;
        }
    }

    pub(crate) fn lifecycle_error(&self, operation: &'static str) -> GeometryError {
        GeometryError::InvalidLifecycle {
            element: self.number,
            operation,
            state: self.state.as_str(),
        }
    }

    pub(crate) fn require_state(
        &self,
        operation: &'static str,
        allowed: &[LifecycleState],
    ) -> Result<(), GeometryError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.lifecycle_error(operation))
        }
    }

    pub(crate) fn require_stepping(&self, operation: &'static str) -> Result<(), GeometryError> {
        if self.state.is_stepping() {
            Ok(())
        } else {
            Err(self.lifecycle_error(operation))
        }
    }

    fn require_not_mapping(&self, operation: &'static str) -> Result<(), GeometryError> {
        if self.state == LifecycleState::MappingInProgress {
            Err(self.lifecycle_error(operation))
        } else {
            Ok(())
        }
    }
}

fn format_values(v: Option<&[f64]>) -> String {
    match v {
        None => "n/a".to_string(),
        Some(v) => v
            .iter()
            .map(|x| format!("{x:.6e}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Orthonormal frame from the first two rows given in a record; the third
/// row is their cross product.
fn local_cs_from_rows(v: &[f64]) -> Result<[[f64; 3]; 3], GeometryError> {
    let malformed = |reason: &str| GeometryError::MalformedRecord {
        key: keys::LOCAL_CS,
        reason: reason.to_string(),
    };
    if v.len() != 6 {
        return Err(malformed("expected 6 components (e1, e2)"));
    }
    let e1 = normalize([v[0], v[1], v[2]]).ok_or_else(|| malformed("zero e1"))?;
    let e2 = normalize([v[3], v[4], v[5]]).ok_or_else(|| malformed("zero e2"))?;
    let e3 = normalize(cross(e1, e2)).ok_or_else(|| malformed("e1 parallel to e2"))?;
    let e2 = cross(e3, e1);
    Ok([e1, e2, e3])
}
