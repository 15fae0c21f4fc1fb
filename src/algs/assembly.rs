//! Assembly-style drivers over the elements of a partition.
//!
//! Only local, active elements contribute; remote mirrors belong to the
//! assembly of their owner.

use crate::data::dof::EquationKind;
use crate::data::time::TimeStep;
use crate::element::ElementEntity;
use crate::geometry_error::GeometryError;
use crate::mesh::Mesh;
use crate::topology::entity_id::EntityId;
use std::collections::BTreeMap;

/// Lumped volume per dof manager: each contributing element's volume (area
/// or length for lower dimensions) is split equally between its dof
/// managers.
pub fn assemble_nodal_volumes(
    mesh: &Mesh,
    step: &TimeStep,
) -> Result<BTreeMap<EntityId, f64>, GeometryError> {
    let domain = mesh.domain();
    let mut out = BTreeMap::new();
    for e in mesh.active_local_elements(step)? {
        let share = e.compute_volume_area_or_length(domain)? / e.number_of_dof_managers() as f64;
        for &dm in e.dof_managers() {
            *out.entry(dm).or_insert(0.0) += share;
        }
    }
    Ok(out)
}

/// Location arrays of every contributing element, keyed by element number.
pub fn assemble_location_arrays(
    mesh: &Mesh,
    eq: EquationKind,
    step: &TimeStep,
) -> Result<Vec<(EntityId, Vec<Option<usize>>)>, GeometryError> {
    mesh.active_local_elements(step)?
        .into_iter()
        .map(|e: &ElementEntity| Ok((e.number(), e.give_location_array(mesh.domain(), eq)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dof::{DofId, DofManager};
    use crate::data::record::{InputRecord, RecordValue, keys};
    use crate::material::{LinearElasticMaterial, SimpleCrossSection};
    use crate::mesh::Domain;
    use crate::topology::element_kind::ElementKind;
    use crate::topology::ownership::{ParallelMode, PartitionList};

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn two_bars() -> Mesh {
        let mut d = Domain::new(1);
        for n in 1..=3 {
            d.add_dof_manager(
                DofManager::node(id(n), [(n - 1) as f64, 0.0, 0.0]).with_dofs(&[DofId::Du]),
            );
        }
        d.add_material(LinearElasticMaterial::new(1.0, 0.0));
        d.add_cross_section(SimpleCrossSection::new(1.0, 2.0));
        let mut m = Mesh::new(d, 0);
        for (n, nodes) in [(1, vec![1, 2]), (2, vec![2, 3])] {
            let mut e = ElementEntity::new(id(n), ElementKind::Truss1d);
            e.initialize_from(
                &InputRecord::new("truss1d", n)
                    .with(keys::MATERIAL, RecordValue::Int(1))
                    .with(keys::CROSS_SECTION, RecordValue::Int(1))
                    .with(keys::NODES, RecordValue::IntList(nodes)),
            )
            .unwrap();
            m.add_element(e).unwrap();
        }
        m.post_initialize().unwrap();
        m
    }

    #[test]
    fn volumes_are_split_between_nodes() {
        let m = two_bars();
        let v = assemble_nodal_volumes(&m, &TimeStep::new(1, 1.0, 1.0)).unwrap();
        // length 1, area 2
        assert_eq!(v.len(), 3);
        assert!((v[&id(1)] - 1.0).abs() < 1e-12);
        assert!((v[&id(2)] - 2.0).abs() < 1e-12);
        assert!((v[&id(3)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn remote_elements_are_skipped() {
        let mut m = two_bars();
        let e = m.element_mut(id(2)).unwrap();
        e.set_parallel_mode(ParallelMode::Remote);
        e.set_partitions(PartitionList::from(vec![0, 1]));
        let v = assemble_nodal_volumes(&m, &TimeStep::new(1, 1.0, 1.0)).unwrap();
        assert!(!v.contains_key(&id(3)));
        assert!((v[&id(2)] - 1.0).abs() < 1e-12);
        let loc = assemble_location_arrays(&m, EquationKind::Momentum, &TimeStep::new(1, 1.0, 1.0))
            .unwrap();
        assert_eq!(loc.len(), 1);
    }
}
