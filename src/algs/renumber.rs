//! Mesh-wide renumbering of dof managers, global element numbers and
//! partition ranks.

use crate::debug_invariants::DebugInvariants;
use crate::element::{EntityRenumbering, RenumberTarget};
use crate::geometry_error::GeometryError;
use crate::mesh::Mesh;
use crate::topology::entity_id::EntityId;
use hashbrown::HashSet;
use log::info;

/// Apply `renumbering` to the domain's dof managers, to the partition rank
/// and to every element's references.
///
/// Every element is planned first; nothing changes unless all plans succeed,
/// the dof-manager map is injective and global element numbers stay unique.
pub fn renumber_mesh<R>(mesh: &mut Mesh, renumbering: &R) -> Result<(), GeometryError>
where
    R: EntityRenumbering + ?Sized,
{
    let plans = mesh
        .elements()
        .iter()
        .map(|e| e.plan_renumbering(renumbering))
        .collect::<Result<Vec<_>, _>>()?;
    let mut globals = HashSet::with_capacity(plans.len());
    if let Some(dup) = plans.iter().find(|p| !globals.insert(p.global_number())) {
        return Err(GeometryError::InvalidPermutation(format!(
            "two elements map onto global number {}",
            dup.global_number()
        )));
    }
    let rank = renumbering
        .renumber(mesh.rank() as u64, RenumberTarget::Partition)
        .and_then(|r| usize::try_from(r).ok())
        .ok_or_else(|| {
            GeometryError::InvalidPermutation(format!("partition {} left unmapped", mesh.rank()))
        })?;

    mesh.domain_mut().renumber_dof_managers(|old| {
        renumbering
            .renumber(old.get(), RenumberTarget::DofManager)
            .and_then(|n| EntityId::new(n).ok())
    })?;
    mesh.set_rank(rank);
    for (e, plan) in mesh.elements_mut().iter_mut().zip(plans) {
        e.apply_renumbering(plan);
    }
    mesh.debug_assert_invariants();
    info!(
        "renumbered {} elements and {} dof managers",
        mesh.number_of_elements(),
        mesh.domain().number_of_dof_managers()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dof::DofManager;
    use crate::element::{ElementEntity, IdentityRenumbering};
    use crate::mesh::Domain;
    use crate::topology::element_kind::ElementKind;

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn mesh() -> Mesh {
        let mut d = Domain::new(1);
        for n in 1..=3 {
            d.add_dof_manager(DofManager::node(id(n), [n as f64, 0.0, 0.0]));
        }
        let mut m = Mesh::new(d, 0);
        for (n, nodes) in [(1, [1, 2]), (2, [2, 3])] {
            let mut e = ElementEntity::new(id(n), ElementKind::Truss1d);
            e.set_dof_managers(nodes.iter().map(|&k| id(k)).collect())
                .unwrap();
            m.add_element(e).unwrap();
        }
        m
    }

    #[test]
    fn shift_renumbers_domain_and_elements_together() {
        let mut m = mesh();
        renumber_mesh(&mut m, &|old: u64, t: RenumberTarget| match t {
            RenumberTarget::DofManager => Some(old + 10),
            RenumberTarget::GlobalElement => Some(old + 100),
            RenumberTarget::Partition => Some(old),
        })
        .unwrap();
        assert!(m.domain().dof_manager(id(12)).is_some());
        assert!(m.domain().dof_manager(id(1)).is_none());
        assert_eq!(m.elements()[1].dof_managers(), &[id(12), id(13)]);
        assert_eq!(m.elements()[0].global_number(), 101);
    }

    #[test]
    fn colliding_globals_change_nothing() {
        let mut m = mesh();
        let err = renumber_mesh(&mut m, &|old: u64, t: RenumberTarget| match t {
            RenumberTarget::GlobalElement => Some(7),
            _ => Some(old + 1),
        })
        .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPermutation(_)));
        assert!(m.domain().dof_manager(id(1)).is_some());
        assert_eq!(m.elements()[0].dof_managers(), &[id(1), id(2)]);
    }

    #[test]
    fn identity_is_a_no_op() {
        let mut m = mesh();
        let before: Vec<ElementEntity> = m.elements().to_vec();
        renumber_mesh(&mut m, &IdentityRenumbering).unwrap();
        assert_eq!(m.elements(), before.as_slice());
    }
}
