//! Refresh of remote element mirrors from their owning partitions.
//!
//! Each rank sends one message to every neighbour rank:
//! `WireHdr | WireCount | element block*`, the blocks being those of its
//! `Local` elements shared with that neighbour, ascending by global number.
//! The byte length travels first on [`ExchangeTags::sizes`].
//!
//! Peers are visited in ascending rank order; the lower rank of each pair
//! sends first, so blocking backends cannot deadlock.

use crate::algs::comm_buffer::{PackBuffer, UnpackBuffer};
use crate::algs::communicator::{Communicator, ExchangeTags, Wait};
use crate::algs::wire::{KIND_ELEMENT_STATE, WIRE_VERSION, WireCount, WireElementHdr, WireHdr, WireSize};
use crate::data::time::TimeStep;
use crate::element::ElementEntity;
use crate::geometry_error::GeometryError;
use crate::mesh::Mesh;
use bytes::Bytes;
use hashbrown::{HashMap, HashSet};
use log::{debug, error};
use std::mem::size_of;

/// Traffic of one exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeReport {
    pub peers: usize,
    pub elements_sent: usize,
    pub elements_received: usize,
    pub bytes_sent: usize,
    pub bytes_received: usize,
}

/// Outgoing message to `peer`.
fn pack_for_peer(mesh: &Mesh, peer: usize, step: &TimeStep) -> Result<(Bytes, usize), GeometryError> {
    let domain = mesh.domain();
    let mut owned: Vec<&ElementEntity> = mesh
        .elements()
        .iter()
        .filter(|e| e.parallel_mode().is_local() && e.partitions().contains(peer))
        .collect();
    owned.sort_unstable_by_key(|e| e.global_number());
    let mut capacity = size_of::<WireHdr>() + size_of::<WireCount>();
    for e in &owned {
        capacity += e.estimate_pack_size(domain)?;
    }
    let mut buf = PackBuffer::with_capacity(capacity);
    buf.put_pod(&WireHdr::new(KIND_ELEMENT_STATE));
    buf.put_pod(&WireCount::new(owned.len()));
    for e in &owned {
        e.pack_unknowns(domain, &mut buf, step)?;
    }
    Ok((buf.freeze(), owned.len()))
}

fn send<C: Communicator>(comm: &C, peer: usize, tags: ExchangeTags, msg: &Bytes) {
    let size = WireSize::new(msg.len());
    comm.isend(peer, tags.sizes, bytemuck::bytes_of(&size)).wait();
    comm.isend(peer, tags.data, msg).wait();
}

fn recv<C: Communicator>(comm: &C, peer: usize, tags: ExchangeTags) -> Result<Bytes, GeometryError> {
    let lost = |what: &str| GeometryError::CommError {
        neighbor: peer,
        reason: format!("no {what} message received"),
    };
    let mut size_buf = [0u8; size_of::<WireSize>()];
    let raw = comm
        .irecv(peer, tags.sizes, &mut size_buf)
        .wait()
        .ok_or_else(|| lost("size"))?;
    let size: WireSize = UnpackBuffer::new(Bytes::from(raw)).get_pod()?;
    let mut data = vec![0u8; size.get()];
    let raw = comm
        .irecv(peer, tags.data, &mut data)
        .wait()
        .ok_or_else(|| lost("data"))?;
    if raw.len() != size.get() {
        return Err(GeometryError::ProtocolDesync(format!(
            "rank {peer} announced {} bytes, sent {}",
            size.get(),
            raw.len()
        )));
    }
    Ok(Bytes::from(raw))
}

/// Apply one received message to the remote mirrors.
fn unpack_from_peer(
    mesh: &mut Mesh,
    peer: usize,
    msg: Bytes,
    remote: &HashMap<u64, usize>,
    refreshed: &mut HashSet<usize>,
    step: &TimeStep,
) -> Result<usize, GeometryError> {
    let mut buf = UnpackBuffer::new(msg);
    let hdr: WireHdr = buf.get_pod()?;
    if hdr.version() != WIRE_VERSION || hdr.kind() != KIND_ELEMENT_STATE {
        return Err(GeometryError::ProtocolDesync(format!(
            "rank {peer}: unexpected header (version {}, kind {})",
            hdr.version(),
            hdr.kind()
        )));
    }
    let count: WireCount = buf.get_pod()?;
    let (domain, elements) = mesh.parts_mut();
    for _ in 0..count.get() {
        let mut probe = buf.clone();
        let block: WireElementHdr = probe.get_pod().map_err(|_| {
            GeometryError::ProtocolDesync(format!("rank {peer}: message ends before its last block"))
        })?;
        let index = *remote.get(&block.global()).ok_or_else(|| {
            GeometryError::ProtocolDesync(format!(
                "rank {peer} sent global element {} which is not a remote element here",
                block.global()
            ))
        })?;
        if !refreshed.insert(index) {
            return Err(GeometryError::ProtocolDesync(format!(
                "global element {} received twice",
                block.global()
            )));
        }
        elements[index].unpack_and_update_unknowns(domain, &mut buf, step)?;
    }
    if !buf.is_empty() {
        return Err(GeometryError::ProtocolDesync(format!(
            "rank {peer}: {} trailing bytes",
            buf.remaining()
        )));
    }
    Ok(count.get())
}

/// Send the state of every owned shared element to its neighbours and
/// overwrite every remote mirror with the owner's state.
///
/// Fails with [`GeometryError::ProtocolDesync`] if a received block has no
/// remote counterpart here, arrives twice, or if a remote element is left
/// without an update.
pub fn exchange_remote_element_data<C: Communicator>(
    mesh: &mut Mesh,
    comm: &C,
    tags: ExchangeTags,
    step: &TimeStep,
) -> Result<ExchangeReport, GeometryError> {
    let rank = mesh.rank();
    if comm.rank() != rank {
        return Err(GeometryError::CommError {
            neighbor: comm.rank(),
            reason: format!("communicator rank {} driving mesh of rank {rank}", comm.rank()),
        });
    }
    let peers = mesh.neighbour_ranks();
    let mut report = ExchangeReport {
        peers: peers.len(),
        ..ExchangeReport::default()
    };

    let mut received = Vec::with_capacity(peers.len());
    for &peer in &peers {
        let (msg, n) = pack_for_peer(mesh, peer, step)?;
        report.elements_sent += n;
        report.bytes_sent += msg.len();
        let incoming = if rank < peer {
            send(comm, peer, tags, &msg);
            recv(comm, peer, tags)?
        } else {
            let incoming = recv(comm, peer, tags)?;
            send(comm, peer, tags, &msg);
            incoming
        };
        report.bytes_received += incoming.len();
        received.push((peer, incoming));
    }

    let remote: HashMap<u64, usize> = mesh
        .elements()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.parallel_mode().is_remote())
        .map(|(i, e)| (e.global_number(), i))
        .collect();
    let mut refreshed = HashSet::with_capacity(remote.len());
    for (peer, msg) in received {
        report.elements_received += unpack_from_peer(mesh, peer, msg, &remote, &mut refreshed, step)
            .inspect_err(|e| error!("rank {rank}: exchange with rank {peer} failed: {e}"))?;
    }
    if refreshed.len() != remote.len() {
        let mut missing: Vec<u64> = remote
            .iter()
            .filter(|(_, i)| !refreshed.contains(*i))
            .map(|(g, _)| *g)
            .collect();
        missing.sort_unstable();
        return Err(GeometryError::ProtocolDesync(format!(
            "rank {rank}: remote elements {missing:?} were not refreshed"
        )));
    }
    debug!(
        "rank {rank}: exchanged with {} peers, sent {} elements ({} bytes), received {} ({} bytes)",
        report.peers,
        report.elements_sent,
        report.bytes_sent,
        report.elements_received,
        report.bytes_received
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    #[test]
    fn serial_mesh_exchanges_nothing() {
        let mut m = Mesh::default();
        let r = exchange_remote_element_data(
            &mut m,
            &NoComm,
            ExchangeTags::default(),
            &TimeStep::new(1, 1.0, 1.0),
        )
        .unwrap();
        assert_eq!(r, ExchangeReport::default());
    }

    #[test]
    fn rank_mismatch_is_rejected() {
        let mut m = Mesh::new(crate::mesh::Domain::new(1), 3);
        assert!(matches!(
            exchange_remote_element_data(
                &mut m,
                &NoComm,
                ExchangeTags::default(),
                &TimeStep::new(1, 1.0, 1.0)
            ),
            Err(GeometryError::CommError { .. })
        ));
    }
}
