use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use element_geometry::algs::comm_buffer::PackBuffer;
use element_geometry::data::dof::DofManager;
use element_geometry::data::record::{InputRecord, RecordValue, keys};
use element_geometry::data::time::TimeStep;
use element_geometry::element::ElementEntity;
use element_geometry::integration::IpTraversal;
use element_geometry::material::{LinearElasticMaterial, SimpleCrossSection};
use element_geometry::mesh::Domain;
use element_geometry::topology::element_kind::ElementKind;
use element_geometry::topology::entity_id::EntityId;

fn id(raw: u64) -> EntityId {
    EntityId::new(raw).expect("nonzero EntityId")
}

fn brick(nip: i64) -> (Domain, ElementEntity) {
    let mut d = Domain::new(1);
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    for (n, x) in corners.into_iter().enumerate() {
        d.add_dof_manager(DofManager::node(id(n as u64 + 1), x));
    }
    d.add_material(LinearElasticMaterial::new(210.0, 0.3).with_history_size(4));
    d.add_cross_section(SimpleCrossSection::default());
    let mut e = ElementEntity::new(id(1), ElementKind::Brick);
    e.initialize_from(
        &InputRecord::new("lspace", 1)
            .with(keys::MATERIAL, RecordValue::Int(1))
            .with(keys::CROSS_SECTION, RecordValue::Int(1))
            .with(keys::NODES, RecordValue::IntList((1..=8).collect()))
            .with(keys::NIP, RecordValue::Int(nip)),
    )
    .expect("valid brick record");
    e.post_initialize(&mut d).expect("brick rules");
    (d, e)
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("ip_traversal");
    let step = TimeStep::new(1, 1.0, 1.0);

    for &nip in &[8i64, 27, 64] {
        let (d, e) = brick(nip);

        group.bench_with_input(BenchmarkId::new("volume", nip), &nip, |b, _| {
            b.iter(|| {
                let v = IpTraversal::new(e.rules())
                    .try_sum(|ip, _| e.compute_volume_around(&d, ip))
                    .expect("volume");
                black_box(v);
            });
        });

        group.bench_with_input(BenchmarkId::new("commit", nip), &nip, |b, _| {
            b.iter(|| e.update_yourself(&d, &step).expect("commit"));
        });

        group.bench_with_input(BenchmarkId::new("pack", nip), &nip, |b, _| {
            let cap = e.estimate_pack_size(&d).expect("estimate");
            b.iter(|| {
                let mut buf = PackBuffer::with_capacity(cap);
                e.pack_unknowns(&d, &mut buf, &step).expect("pack");
                black_box(buf.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
