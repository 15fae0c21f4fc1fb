mod util;

use element_geometry::{
    algs::comm_buffer::{PackBuffer, UnpackBuffer},
    algs::communicator::{CommTag, ExchangeTags, LocalComm},
    algs::exchange::exchange_remote_element_data,
    data::time::TimeStep,
    geometry_error::GeometryError,
    integration::IpTraversal,
    material::InternalStateType,
    mesh::Mesh,
};
use serial_test::serial;
use util::*;

fn ip_values(m: &Mesh, number: u64, kind: InternalStateType) -> Vec<Option<Vec<f64>>> {
    let e = m.element(id(number)).unwrap();
    let step = TimeStep::new(1, 1.0, 1.0);
    IpTraversal::new(e.rules())
        .iter()
        .map(|(ip, _)| e.give_ip_value(m.domain(), ip, kind, &step).unwrap())
        .collect()
}

#[test]
fn mirror_matches_owner_after_pack_and_unpack() {
    let owner = shared_strip(0);
    let mut mirror = shared_strip(1);
    commit_state(&owner, 1, |k| 1.5 + k as f64);
    let step = TimeStep::new(3, 3.0, 1.0);

    let e = owner.element(id(1)).unwrap();
    let mut buf = PackBuffer::with_capacity(e.estimate_pack_size(owner.domain()).unwrap());
    let written = e.pack_unknowns(owner.domain(), &mut buf, &step).unwrap();
    assert!(written <= e.estimate_pack_size(owner.domain()).unwrap());

    let (domain, elements) = mirror.parts_mut();
    let mut rd = UnpackBuffer::new(buf.freeze());
    elements[0]
        .unpack_and_update_unknowns(domain, &mut rd, &step)
        .unwrap();
    assert!(rd.is_empty());

    for kind in [InternalStateType::Stress, InternalStateType::HistoryVariables] {
        assert_eq!(ip_values(&mirror, 1, kind), ip_values(&owner, 1, kind));
    }
}

#[test]
#[serial]
fn exchange_refreshes_both_directions() {
    let step = TimeStep::new(1, 1.0, 1.0);
    let tags = ExchangeTags::from_base(CommTag::new(0x2000));
    let handles: Vec<_> = (0..2)
        .map(|rank| {
            std::thread::spawn(move || {
                let mut m = shared_strip(rank);
                // each rank owns element rank + 1
                commit_state(&m, rank as u64 + 1, |k| (10 * (rank + 1) + k) as f64);
                let comm = LocalComm::new(rank, 2);
                let report = exchange_remote_element_data(&mut m, &comm, tags, &step).unwrap();
                (m, report)
            })
        })
        .collect();
    let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (m1, r1) = results.pop().unwrap();
    let (m0, r0) = results.pop().unwrap();

    assert_eq!(r0.peers, 1);
    assert_eq!((r0.elements_sent, r0.elements_received), (1, 1));
    assert_eq!(r0.bytes_sent, r1.bytes_received);
    assert_eq!(r1.bytes_sent, r0.bytes_received);
    for number in [1, 2] {
        let a = ip_values(&m0, number, InternalStateType::Stress);
        let b = ip_values(&m1, number, InternalStateType::Stress);
        assert_eq!(a, b);
    }
    assert_eq!(
        ip_values(&m1, 1, InternalStateType::Stress)[0].as_deref(),
        Some(&[10.0, 10.0, 10.0][..])
    );
}

#[test]
#[serial]
fn unmatched_remote_element_is_a_desync() {
    let step = TimeStep::new(1, 1.0, 1.0);
    let tags = ExchangeTags::from_base(CommTag::new(0x2100));
    let handles: Vec<_> = (0..2)
        .map(|rank| {
            std::thread::spawn(move || {
                let mut m = shared_strip(rank);
                if rank == 1 {
                    // rank 1 no longer believes it owns element 2
                    m.element_mut(id(2))
                        .unwrap()
                        .set_parallel_mode(element_geometry::topology::ownership::ParallelMode::Remote);
                }
                let comm = LocalComm::new(rank, 2);
                exchange_remote_element_data(&mut m, &comm, tags, &step)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(matches!(results[0], Err(GeometryError::ProtocolDesync(_))));
    assert!(matches!(results[1], Err(GeometryError::ProtocolDesync(_))));
}
