//! Persisted element context.
//!
//! Layout: scalar fields, the parallel metadata, the dof-manager list, then
//! each rule's point count followed by its points' material contexts in
//! traversal order.

use super::ElementEntity;
use crate::data::stream::DataStream;
use crate::geometry_error::GeometryError;
use crate::integration::IpTraversal;
use crate::mesh::Domain;
use crate::topology::element_kind::ElementGeometry;
use crate::topology::entity_id::EntityId;
use crate::topology::ownership::{ParallelMode, PartitionList};
use log::debug;

impl ElementEntity {
    pub fn save_context(
        &self,
        domain: &Domain,
        stream: &mut dyn DataStream,
    ) -> Result<(), GeometryError> {
        self.require_stepping("save_context")?;
        let cross_section = domain.cross_section(self.cross_section)?;
        stream.write_u64(self.number.get());
        stream.write_u64(self.global_number);
        stream.write_usize(self.material);
        stream.write_usize(self.cross_section);
        stream.write_usize(self.activity_time_function.unwrap_or(0));
        stream.write_usize(self.nip.unwrap_or(0));
        match &self.local_cs {
            None => stream.write_u8(0),
            Some(lcs) => {
                stream.write_u8(1);
                for row in lcs {
                    for &v in row {
                        stream.write_f64(v);
                    }
                }
            }
        }
        stream.write_u8(self.parallel_mode.to_wire());
        stream.write_u32(self.partitions.len() as u32);
        for rank in self.partitions.iter() {
            stream.write_usize(rank);
        }
        stream.write_u32(self.dof_managers.len() as u32);
        for dm in &self.dof_managers {
            stream.write_u64(dm.get());
        }
        stream.write_u32(self.rules.len() as u32);
        for (_, rule) in self.rules.iter() {
            stream.write_u32(rule.len() as u32);
        }
        IpTraversal::new(&self.rules).try_for_each(|ip, gp| {
            let h = self.status_handle(ip, gp)?;
            domain
                .statuses()
                .read(h, |s| cross_section.save_ip_context(s, &mut *stream))
        })?;
        debug!("element {}: context saved", self.number);
        Ok(())
    }

    /// Restore from a stream written by [`save_context`](Self::save_context)
    /// for this element on a structurally identical mesh. Nothing is changed
    /// unless the whole record validates.
    pub fn restore_context(
        &mut self,
        domain: &Domain,
        stream: &mut dyn DataStream,
    ) -> Result<(), GeometryError> {
        self.require_stepping("restore_context")?;
        let cross_section = domain.cross_section(self.cross_section)?;
        let number = stream.read_u64()?;
        if number != self.number.get() {
            return Err(GeometryError::ContextMismatch(format!(
                "context of element {number} restored into element {}",
                self.number
            )));
        }
        let global_number = stream.read_u64()?;
        let material = stream.read_usize()?;
        let cs_index = stream.read_usize()?;
        let activity = Some(stream.read_usize()?).filter(|&n| n > 0);
        let nip = Some(stream.read_usize()?).filter(|&n| n > 0);
        let local_cs = match stream.read_u8()? {
            0 => None,
            1 => {
                let mut lcs = [[0.0; 3]; 3];
                for row in lcs.iter_mut() {
                    for v in row.iter_mut() {
                        *v = stream.read_f64()?;
                    }
                }
                Some(lcs)
            }
            other => {
                return Err(GeometryError::ContextMismatch(format!(
                    "bad local-cs flag {other}"
                )));
            }
        };
        let mode_tag = stream.read_u8()?;
        let parallel_mode = ParallelMode::from_wire(mode_tag).ok_or_else(|| {
            GeometryError::ContextMismatch(format!("bad parallel mode tag {mode_tag}"))
        })?;
        let n_partitions = stream.read_u32()? as usize;
        let partitions: PartitionList = (0..n_partitions)
            .map(|_| stream.read_usize())
            .collect::<Result<Vec<_>, _>>()?
            .into();
        let n_dofman = stream.read_u32()? as usize;
        if n_dofman != self.kind.number_of_dof_managers() {
            return Err(GeometryError::ContextMismatch(format!(
                "{n_dofman} dof managers stored for a {} element",
                self.kind
            )));
        }
        let dof_managers = (0..n_dofman)
            .map(|_| {
                let raw = stream.read_u64()?;
                EntityId::new(raw).map_err(|_| {
                    GeometryError::ContextMismatch(format!("invalid dof manager number {raw}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let n_rules = stream.read_u32()? as usize;
        if n_rules != self.rules.len() {
            return Err(GeometryError::ContextMismatch(format!(
                "{n_rules} rules stored, element {} has {}",
                self.number,
                self.rules.len()
            )));
        }
        for (id, rule) in self.rules.iter() {
            let n = stream.read_u32()? as usize;
            if n != rule.len() {
                return Err(GeometryError::ContextMismatch(format!(
                    "rule {} of element {}: {n} points stored, {} present",
                    id.index() + 1,
                    self.number,
                    rule.len()
                )));
            }
        }
        let mut staged = Vec::with_capacity(self.rules.point_count());
        for (ip, gp) in IpTraversal::new(&self.rules).iter() {
            let h = self.status_handle(ip, gp)?;
            staged.push((h, cross_section.restore_ip_context(&mut *stream)?));
        }

        for (h, status) in staged {
            domain.statuses().replace(h, status)?;
        }
        self.global_number = global_number;
        self.material = material;
        self.cross_section = cs_index;
        self.activity_time_function = activity;
        self.nip = nip;
        self.local_cs = local_cs;
        self.parallel_mode = parallel_mode;
        self.partitions = partitions;
        self.dof_managers = dof_managers;
        debug!("element {}: context restored", self.number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::dof::DofManager;
    use crate::data::record::{InputRecord, RecordValue, keys};
    use crate::data::stream::MemoryStream;
    use crate::element::ElementEntity;
    use crate::geometry_error::GeometryError;
    use crate::integration::IpTraversal;
    use crate::material::{LinearElasticMaterial, SimpleCrossSection};
    use crate::mesh::Domain;
    use crate::topology::element_kind::ElementKind;
    use crate::topology::entity_id::EntityId;
    use crate::topology::ownership::{ParallelMode, PartitionList};

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn quad(number: u64) -> (Domain, ElementEntity) {
        let mut d = Domain::new(1);
        for (n, x) in [
            (1, [0.0, 0.0, 0.0]),
            (2, [1.0, 0.0, 0.0]),
            (3, [1.0, 1.0, 0.0]),
            (4, [0.0, 1.0, 0.0]),
        ] {
            d.add_dof_manager(DofManager::node(id(n), x));
        }
        d.add_material(LinearElasticMaterial::new(1.0, 0.25).with_history_size(2));
        d.add_cross_section(SimpleCrossSection::new(0.2, 1.0));
        let mut e = ElementEntity::new(id(number), ElementKind::PlaneStressQuad);
        e.initialize_from(
            &InputRecord::new("planestress2d", number)
                .with(keys::MATERIAL, RecordValue::Int(1))
                .with(keys::CROSS_SECTION, RecordValue::Int(1))
                .with(keys::NODES, RecordValue::IntList(vec![1, 2, 3, 4]))
                .with(keys::LOCAL_CS, RecordValue::RealList(vec![0.0, 1.0, 0.0, -1.0, 0.0, 0.0])),
        )
        .unwrap();
        e.post_initialize(&mut d).unwrap();
        (d, e)
    }

    #[test]
    fn save_restore_reconstructs_state() {
        let (d, mut e) = quad(7);
        e.set_global_number(700);
        e.set_parallel_mode(ParallelMode::Remote);
        e.set_partitions(PartitionList::from(vec![0, 2]));
        for (k, (_, gp)) in IpTraversal::new(e.rules()).iter().enumerate() {
            d.statuses()
                .write(gp.status().unwrap(), |s| {
                    s.set_temp_stress(&[k as f64, 1.0, 2.0]);
                    s.set_temp_history(&[0.5, k as f64]);
                    s.commit();
                })
                .unwrap();
        }
        let mut stream = MemoryStream::new();
        e.save_context(&d, &mut stream).unwrap();

        let (d2, mut e2) = quad(7);
        e2.restore_context(&d2, &mut stream).unwrap();
        assert_eq!(stream.remaining(), 0);
        assert_eq!(e2.global_number(), 700);
        assert_eq!(e2.parallel_mode(), ParallelMode::Remote);
        assert_eq!(e2.partitions(), e.partitions());
        assert_eq!(e2.give_local_coordinate_system(), e.give_local_coordinate_system());
        let a = IpTraversal::new(e.rules()).iter();
        let b = IpTraversal::new(e2.rules()).iter();
        for ((_, ga), (_, gb)) in a.zip(b) {
            assert_eq!(
                d.statuses().snapshot(ga.status().unwrap()).unwrap(),
                d2.statuses().snapshot(gb.status().unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn restore_into_other_element_is_rejected() {
        let (d, e) = quad(1);
        let mut stream = MemoryStream::new();
        e.save_context(&d, &mut stream).unwrap();
        let (d2, mut e2) = quad(2);
        let before = e2.clone();
        assert!(matches!(
            e2.restore_context(&d2, &mut stream),
            Err(GeometryError::ContextMismatch(_))
        ));
        assert_eq!(e2, before);
    }

    #[test]
    fn truncated_stream_leaves_element_untouched() {
        let (d, e) = quad(3);
        let mut stream = MemoryStream::new();
        e.save_context(&d, &mut stream).unwrap();
        let bytes = stream.into_bytes();
        let mut short = MemoryStream::from_bytes(bytes.slice(..bytes.len() - 8));
        let (d2, mut e2) = quad(3);
        let before = e2.clone();
        assert!(e2.restore_context(&d2, &mut short).is_err());
        assert_eq!(e2, before);
    }
}
