mod util;

use element_geometry::{
    algs::comm_buffer::{PackBuffer, UnpackBuffer},
    data::record::{RecordValue, keys},
    data::time::TimeStep,
    element::ElementEntity,
    integration::IpTraversal,
    mesh::Domain,
    topology::element_kind::ElementKind,
};
use proptest::prelude::*;
use util::*;

fn brick(nip: i64, history: usize) -> (Domain, ElementEntity) {
    let mut nodes = Vec::new();
    for (n, x) in [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ]
    .into_iter()
    .enumerate()
    {
        nodes.push((n as u64 + 1, x));
    }
    let mut d = domain(&nodes, history);
    let mut e = element(
        ElementKind::Brick,
        &record(ElementKind::Brick, 1, &[1, 2, 3, 4, 5, 6, 7, 8]).with(keys::NIP, RecordValue::Int(nip)),
    );
    e.post_initialize(&mut d).unwrap();
    (d, e)
}

fn fill(d: &Domain, e: &ElementEntity, values: &[f64]) {
    for (k, (_, gp)) in IpTraversal::new(e.rules()).iter().enumerate() {
        let v = values[k % values.len()];
        d.statuses()
            .write(gp.status().unwrap(), |s| {
                s.set_temp_strain(&vec![v; s.strain_size()]);
                s.set_temp_stress(&vec![2.0 * v; s.strain_size()]);
                s.set_temp_history(&vec![-v; s.history_size()]);
                s.commit();
                // leave a trial state that differs from the committed one
                s.set_temp_stress(&vec![v + 1.0; s.strain_size()]);
            })
            .unwrap();
    }
}

proptest! {
    #[test]
    fn pack_then_unpack_reproduces_every_point(
        nip in prop::sample::select(vec![1i64, 8, 27]),
        history in 0usize..4,
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..16),
    ) {
        let (d, e) = brick(nip, history);
        fill(&d, &e, &values);
        let (d2, mut e2) = brick(nip, history);
        let step = TimeStep::new(5, 5.0, 1.0);

        let estimate = e.estimate_pack_size(&d).unwrap();
        let mut buf = PackBuffer::new();
        let written = e.pack_unknowns(&d, &mut buf, &step).unwrap();
        prop_assert!(estimate >= written);
        prop_assert_eq!(written, buf.len());

        let mut rd = UnpackBuffer::new(buf.freeze());
        e2.unpack_and_update_unknowns(&d2, &mut rd, &step).unwrap();
        prop_assert!(rd.is_empty());
        let a = IpTraversal::new(e.rules()).iter();
        let b = IpTraversal::new(e2.rules()).iter();
        for ((_, ga), (_, gb)) in a.zip(b) {
            prop_assert_eq!(
                d.statuses().snapshot(ga.status().unwrap()).unwrap(),
                d2.statuses().snapshot(gb.status().unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn truncated_blocks_are_rejected(cut in 1usize..64) {
        let (d, e) = brick(8, 1);
        fill(&d, &e, &[3.0]);
        let (d2, mut e2) = brick(8, 1);
        let step = TimeStep::new(1, 1.0, 1.0);
        let mut buf = PackBuffer::new();
        e.pack_unknowns(&d, &mut buf, &step).unwrap();
        let bytes = buf.freeze();
        let cut = cut.min(bytes.len());
        let mut rd = UnpackBuffer::new(bytes.slice(..bytes.len() - cut));
        prop_assert!(e2.unpack_and_update_unknowns(&d2, &mut rd, &step).is_err());
    }
}
