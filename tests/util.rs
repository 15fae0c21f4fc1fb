#![allow(dead_code)]
use element_geometry::{
    data::dof::{DofId, DofManager},
    data::record::{InputRecord, RecordValue, keys},
    element::ElementEntity,
    integration::IpTraversal,
    material::{LinearElasticMaterial, SimpleCrossSection},
    mesh::{Domain, Mesh},
    topology::element_kind::{ElementGeometry, ElementKind},
    topology::entity_id::EntityId,
    topology::ownership::{ParallelMode, PartitionList},
};

pub fn id(u: u64) -> EntityId {
    EntityId::new(u).unwrap()
}

/// Record with the mandatory keys for `kind`.
pub fn record(kind: ElementKind, number: u64, nodes: &[u64]) -> InputRecord {
    InputRecord::new(kind.name(), number)
        .with(keys::MATERIAL, RecordValue::Int(1))
        .with(keys::CROSS_SECTION, RecordValue::Int(1))
        .with(
            keys::NODES,
            RecordValue::IntList(nodes.iter().map(|&n| n as i64).collect()),
        )
}

/// Domain with the given nodes (3 displacement dofs each), one elastic
/// material with `history` history variables and one default cross section.
pub fn domain(nodes: &[(u64, [f64; 3])], history: usize) -> Domain {
    let mut d = Domain::new(1);
    for &(n, x) in nodes {
        d.add_dof_manager(DofManager::node(id(n), x).with_dofs(DofId::displacements(3)));
    }
    d.add_material(LinearElasticMaterial::new(210.0, 0.3).with_history_size(history));
    d.add_cross_section(SimpleCrossSection::default());
    d
}

/// Element initialized from `ir`, not yet post-initialized.
pub fn element(kind: ElementKind, ir: &InputRecord) -> ElementEntity {
    let mut e = ElementEntity::new(id(ir.number), kind);
    e.initialize_from(ir).unwrap();
    e
}

/// Unit-square mesh of `n × n` plane-stress quads, numbered row by row.
pub fn quad_grid(n: u64, size: f64, rank: usize) -> Mesh {
    let h = size / n as f64;
    let node = |i: u64, j: u64| j * (n + 1) + i + 1;
    let mut nodes = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            nodes.push((node(i, j), [i as f64 * h, j as f64 * h, 0.0]));
        }
    }
    let mut m = Mesh::new(domain(&nodes, 2), rank);
    for j in 0..n {
        for i in 0..n {
            let number = j * n + i + 1;
            let ir = record(
                ElementKind::PlaneStressQuad,
                number,
                &[node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)],
            );
            m.add_element(element(ElementKind::PlaneStressQuad, &ir)).unwrap();
        }
    }
    m.post_initialize().unwrap();
    m
}

/// One partition of a two-element strip split between ranks 0 and 1.
///
/// Element 1 (global 10) is owned by rank 0 and element 2 (global 20) by
/// rank 1; each rank holds a remote mirror of the other's element.
pub fn shared_strip(rank: usize) -> Mesh {
    let nodes = [
        (1, [0.0, 0.0, 0.0]),
        (2, [1.0, 0.0, 0.0]),
        (3, [1.0, 1.0, 0.0]),
        (4, [0.0, 1.0, 0.0]),
        (5, [2.0, 0.0, 0.0]),
        (6, [2.0, 1.0, 0.0]),
    ];
    let mut m = Mesh::new(domain(&nodes, 2), rank);
    for (number, global, owner, conn) in [(1, 10, 0, [1, 2, 3, 4]), (2, 20, 1, [2, 5, 6, 3])] {
        let mut e = element(
            ElementKind::PlaneStressQuad,
            &record(ElementKind::PlaneStressQuad, number, &conn),
        );
        e.set_global_number(global);
        e.set_partitions(PartitionList::from(vec![0, 1]));
        e.set_parallel_mode(if owner == rank {
            ParallelMode::Local
        } else {
            ParallelMode::Remote
        });
        m.add_element(e).unwrap();
    }
    m.post_initialize().unwrap();
    m
}

/// Commit `f(k)` as every point's stress and history, `k` counting points
/// across the element in traversal order.
pub fn commit_state(m: &Mesh, number: u64, f: impl Fn(usize) -> f64) {
    let e = m.element(id(number)).unwrap();
    for (k, (_, gp)) in IpTraversal::new(e.rules()).iter().enumerate() {
        let v = f(k);
        m.domain()
            .statuses()
            .write(gp.status().unwrap(), |s| {
                let stress = vec![v; s.stress().len()];
                s.set_temp_stress(&stress);
                let hist = vec![-v; s.history().len()];
                s.set_temp_history(&hist);
                s.commit();
            })
            .unwrap();
    }
}
