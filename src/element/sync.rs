//! Packing and unpacking of integration-point state for partition exchange.
//!
//! Block layout: [`WireElementHdr`], then per point in traversal order a
//! `u32` payload length and the payload written by the cross section.

use super::ElementEntity;
use crate::algs::comm_buffer::{PackBuffer, UnpackBuffer};
use crate::algs::wire::WireElementHdr;
use crate::data::time::TimeStep;
use crate::geometry_error::GeometryError;
use crate::integration::IpTraversal;
use crate::material::{MaterialStatus, StatusHandle};
use crate::mesh::Domain;
use log::{debug, error};
use std::mem::size_of;

/// Short reads inside an element block mean the peers disagree.
fn as_desync(e: GeometryError) -> GeometryError {
    match e {
        GeometryError::BufferUnderflow { needed, remaining } => GeometryError::ProtocolDesync(
            format!("element block truncated: needed {needed} bytes, {remaining} remaining"),
        ),
        other => other,
    }
}

impl ElementEntity {
    /// Upper bound on the bytes [`pack_unknowns`](Self::pack_unknowns) writes.
    ///
    /// Each point counts the larger of the material's declared size and the
    /// size of the status it currently holds, so a status grown past its
    /// declared shape is still covered.
    pub fn estimate_pack_size(&self, domain: &Domain) -> Result<usize, GeometryError> {
        let material = domain.material(self.material)?;
        let cross_section = domain.cross_section(self.cross_section)?;
        let store = domain.statuses();
        let points = IpTraversal::new(&self.rules).try_sum(|_, gp| {
            let declared = cross_section.estimate_pack_size(material, gp.material_mode());
            let live = match gp.status() {
                Some(h) => store.read(h, |s| s.packed_len())?,
                None => 0,
            };
            Ok::<usize, GeometryError>(4 + declared.max(live))
        })?;
        Ok(size_of::<WireElementHdr>() + points)
    }

    /// Append this element's state block to `buf`; returns the bytes written.
    pub fn pack_unknowns(
        &self,
        domain: &Domain,
        buf: &mut PackBuffer,
        _step: &TimeStep,
    ) -> Result<usize, GeometryError> {
        self.require_stepping("pack_unknowns")?;
        let material = domain.material(self.material)?;
        let cross_section = domain.cross_section(self.cross_section)?;
        let start = buf.len();
        buf.put_pod(&WireElementHdr::new(self.global_number, self.rules.point_count()));
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            domain.statuses().read(h, |s| {
                buf.put_length_prefixed(|b| cross_section.pack_unknowns(material, s, b));
            })
        })?;
        let written = buf.len() - start;
        debug!(
            "element {} (global {}): packed {} points, {written} bytes",
            self.number,
            self.global_number,
            self.rules.point_count()
        );
        Ok(written)
    }

    /// Read this element's state block from `buf` and overwrite the points'
    /// state. Every point is decoded before any is written, so a rejected
    /// block leaves the element unchanged.
    pub fn unpack_and_update_unknowns(
        &mut self,
        domain: &Domain,
        buf: &mut UnpackBuffer,
        _step: &TimeStep,
    ) -> Result<(), GeometryError> {
        self.require_stepping("unpack_and_update_unknowns")?;
        let staged = self.decode_block(domain, buf).inspect_err(|e| {
            error!("element {} (global {}): {e}", self.number, self.global_number);
        })?;
        let store = domain.statuses();
        for (h, status) in staged {
            store.replace(h, status)?;
        }
        Ok(())
    }

    fn decode_block(
        &self,
        domain: &Domain,
        buf: &mut UnpackBuffer,
    ) -> Result<Vec<(StatusHandle, MaterialStatus)>, GeometryError> {
        let material = domain.material(self.material)?;
        let cross_section = domain.cross_section(self.cross_section)?;
        let hdr: WireElementHdr = buf.get_pod().map_err(as_desync)?;
        if hdr.global() != self.global_number {
            return Err(GeometryError::ProtocolDesync(format!(
                "block for global element {} read by global element {}",
                hdr.global(),
                self.global_number
            )));
        }
        let n_points = self.rules.point_count();
        if hdr.n_points() != n_points {
            return Err(GeometryError::ProtocolDesync(format!(
                "global element {}: {} points received, {n_points} present",
                self.global_number,
                hdr.n_points()
            )));
        }
        let mut staged = Vec::with_capacity(n_points);
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            let len = buf.get_u32().map_err(as_desync)? as usize;
            let mut payload = buf.split_to(len).map_err(as_desync)?;
            let status = cross_section
                .unpack_unknowns(material, gp.material_mode(), &mut payload)
                .map_err(as_desync)?;
            if !payload.is_empty() {
                return Err(GeometryError::ProtocolDesync(format!(
                    "global element {}, point {}: {} trailing payload bytes",
                    self.global_number,
                    gp.number(),
                    payload.remaining()
                )));
            }
            staged.push((h, status));
            Ok(())
        })?;
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::comm_buffer::{PackBuffer, UnpackBuffer};
    use crate::data::dof::DofManager;
    use crate::data::record::{InputRecord, RecordValue, keys};
    use crate::data::time::TimeStep;
    use crate::element::ElementEntity;
    use crate::geometry_error::GeometryError;
    use crate::integration::IpTraversal;
    use crate::material::{LinearElasticMaterial, SimpleCrossSection};
    use crate::mesh::Domain;
    use crate::topology::element_kind::ElementKind;
    use crate::topology::entity_id::EntityId;

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn tet(nip: i64) -> (Domain, ElementEntity) {
        let mut d = Domain::new(1);
        for (n, x) in [
            (1, [0.0, 0.0, 0.0]),
            (2, [1.0, 0.0, 0.0]),
            (3, [0.0, 1.0, 0.0]),
            (4, [0.0, 0.0, 1.0]),
        ] {
            d.add_dof_manager(DofManager::node(id(n), x));
        }
        d.add_material(LinearElasticMaterial::new(1.0, 0.3).with_history_size(1));
        d.add_cross_section(SimpleCrossSection::default());
        let mut e = ElementEntity::new(id(1), ElementKind::Tetrahedron);
        e.initialize_from(
            &InputRecord::new("ltrspace", 1)
                .with(keys::MATERIAL, RecordValue::Int(1))
                .with(keys::CROSS_SECTION, RecordValue::Int(1))
                .with(keys::NODES, RecordValue::IntList(vec![1, 2, 3, 4]))
                .with(keys::NIP, RecordValue::Int(nip)),
        )
        .unwrap();
        e.post_initialize(&mut d).unwrap();
        (d, e)
    }

    #[test]
    fn estimate_is_exact_for_fixed_shape_statuses() {
        let (d, e) = tet(4);
        let mut buf = PackBuffer::new();
        let written = e.pack_unknowns(&d, &mut buf, &TimeStep::new(1, 1.0, 1.0)).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(e.estimate_pack_size(&d).unwrap(), written);
    }

    #[test]
    fn estimate_covers_statuses_grown_past_their_shape() {
        let (d, e) = tet(4);
        for (_, gp) in IpTraversal::new(e.rules()).iter() {
            d.statuses()
                .write(gp.status().unwrap(), |s| {
                    s.set_temp_history(&[1.0, 2.0, 3.0]);
                    s.commit();
                })
                .unwrap();
        }
        let mut buf = PackBuffer::new();
        let written = e.pack_unknowns(&d, &mut buf, &TimeStep::new(1, 1.0, 1.0)).unwrap();
        assert!(e.estimate_pack_size(&d).unwrap() >= written);
    }

    #[test]
    fn point_count_mismatch_is_desync() {
        let (d, e) = tet(4);
        let (d1, mut e1) = tet(1);
        let step = TimeStep::new(1, 1.0, 1.0);
        let mut buf = PackBuffer::new();
        e.pack_unknowns(&d, &mut buf, &step).unwrap();
        let mut rd = UnpackBuffer::new(buf.freeze());
        assert!(matches!(
            e1.unpack_and_update_unknowns(&d1, &mut rd, &step),
            Err(GeometryError::ProtocolDesync(_))
        ));
    }

    #[test]
    fn truncated_block_changes_nothing() {
        let (d, e) = tet(4);
        let (d2, mut e2) = tet(4);
        let step = TimeStep::new(1, 1.0, 1.0);
        for (_, gp) in IpTraversal::new(e.rules()).iter() {
            d.statuses()
                .write(gp.status().unwrap(), |s| {
                    s.set_temp_history(&[9.0]);
                    s.commit();
                })
                .unwrap();
        }
        let mut buf = PackBuffer::new();
        e.pack_unknowns(&d, &mut buf, &step).unwrap();
        let bytes = buf.freeze();
        let mut rd = UnpackBuffer::new(bytes.slice(..bytes.len() - 1));
        assert!(matches!(
            e2.unpack_and_update_unknowns(&d2, &mut rd, &step),
            Err(GeometryError::ProtocolDesync(_))
        ));
        for (_, gp) in IpTraversal::new(e2.rules()).iter() {
            let s = d2.statuses().snapshot(gp.status().unwrap()).unwrap();
            assert_eq!(s.history(), &[0.0]);
        }
    }

    #[test]
    fn wrong_global_number_is_desync() {
        let (d, e) = tet(1);
        let (d2, mut e2) = tet(1);
        e2.set_global_number(99);
        let step = TimeStep::new(1, 1.0, 1.0);
        let mut buf = PackBuffer::new();
        e.pack_unknowns(&d, &mut buf, &step).unwrap();
        let mut rd = UnpackBuffer::new(buf.freeze());
        assert!(e2.unpack_and_update_unknowns(&d2, &mut rd, &step).is_err());
    }
}
