//! Per-point material state and the store that owns it.
//!
//! Integration points hold a [`StatusHandle`]; the [`StatusStore`] in the
//! domain owns the [`MaterialStatus`] behind a `parking_lot::RwLock` per slot,
//! so step hooks over distinct elements may run concurrently.

use crate::algs::comm_buffer::{PackBuffer, UnpackBuffer};
use crate::data::stream::DataStream;
use crate::geometry_error::GeometryError;
use parking_lot::RwLock;

/// Equilibrium and trial state of one integration point.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialStatus {
    strain: Vec<f64>,
    stress: Vec<f64>,
    history: Vec<f64>,
    temp_strain: Vec<f64>,
    temp_stress: Vec<f64>,
    temp_history: Vec<f64>,
}

impl MaterialStatus {
    /// Zeroed status with `strain_size` stress/strain components and
    /// `history_size` history variables.
    pub fn new(strain_size: usize, history_size: usize) -> Self {
        Self {
            strain: vec![0.0; strain_size],
            stress: vec![0.0; strain_size],
            history: vec![0.0; history_size],
            temp_strain: vec![0.0; strain_size],
            temp_stress: vec![0.0; strain_size],
            temp_history: vec![0.0; history_size],
        }
    }

    pub fn strain(&self) -> &[f64] {
        &self.strain
    }
    pub fn stress(&self) -> &[f64] {
        &self.stress
    }
    pub fn history(&self) -> &[f64] {
        &self.history
    }
    pub fn temp_strain(&self) -> &[f64] {
        &self.temp_strain
    }
    pub fn temp_stress(&self) -> &[f64] {
        &self.temp_stress
    }
    pub fn temp_history(&self) -> &[f64] {
        &self.temp_history
    }

    pub fn strain_size(&self) -> usize {
        self.strain.len()
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    pub fn set_temp_strain(&mut self, v: &[f64]) {
        self.temp_strain.clear();
        self.temp_strain.extend_from_slice(v);
    }

    pub fn set_temp_stress(&mut self, v: &[f64]) {
        self.temp_stress.clear();
        self.temp_stress.extend_from_slice(v);
    }

    pub fn set_temp_history(&mut self, v: &[f64]) {
        self.temp_history.clear();
        self.temp_history.extend_from_slice(v);
    }

    /// Trial state := equilibrium state.
    pub fn init_temp(&mut self) {
        self.temp_strain.clone_from(&self.strain);
        self.temp_stress.clone_from(&self.stress);
        self.temp_history.clone_from(&self.history);
    }

    /// Equilibrium state := trial state.
    pub fn commit(&mut self) {
        self.strain.clone_from(&self.temp_strain);
        self.stress.clone_from(&self.temp_stress);
        self.history.clone_from(&self.temp_history);
    }

    /// Trial state := equilibrium state of `source`.
    pub fn assign_temp_from(&mut self, source: &MaterialStatus) {
        self.temp_strain.clone_from(&source.strain);
        self.temp_stress.clone_from(&source.stress);
        self.temp_history.clone_from(&source.history);
    }

    fn vectors(&self) -> [&Vec<f64>; 6] {
        [
            &self.strain,
            &self.stress,
            &self.history,
            &self.temp_strain,
            &self.temp_stress,
            &self.temp_history,
        ]
    }

    /// Exact number of bytes written by [`MaterialStatus::pack`].
    pub fn packed_len(&self) -> usize {
        self.vectors().iter().map(|v| 4 + 8 * v.len()).sum()
    }

    /// Bytes needed to pack a status of the given shape.
    pub fn packed_len_for(strain_size: usize, history_size: usize) -> usize {
        6 * 4 + 8 * (4 * strain_size + 2 * history_size)
    }

    pub fn pack(&self, buf: &mut PackBuffer) {
        for v in self.vectors() {
            buf.put_f64_slice(v);
        }
    }

    pub fn unpack(buf: &mut UnpackBuffer) -> Result<Self, GeometryError> {
        Ok(Self {
            strain: buf.get_f64_vec()?,
            stress: buf.get_f64_vec()?,
            history: buf.get_f64_vec()?,
            temp_strain: buf.get_f64_vec()?,
            temp_stress: buf.get_f64_vec()?,
            temp_history: buf.get_f64_vec()?,
        })
    }

    pub fn save_context(&self, stream: &mut dyn DataStream) {
        for v in self.vectors() {
            stream.write_f64_slice(v);
        }
    }

    pub fn restore_context(stream: &mut dyn DataStream) -> Result<Self, GeometryError> {
        Ok(Self {
            strain: stream.read_f64_vec()?,
            stress: stream.read_f64_vec()?,
            history: stream.read_f64_vec()?,
            temp_strain: stream.read_f64_vec()?,
            temp_stress: stream.read_f64_vec()?,
            temp_history: stream.read_f64_vec()?,
        })
    }
}

/// Opaque reference from an integration point into a [`StatusStore`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StatusHandle(usize);

impl StatusHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Slot storage for material statuses, with slot reuse.
#[derive(Debug, Default)]
pub struct StatusStore {
    slots: Vec<RwLock<Option<MaterialStatus>>>,
    free: Vec<usize>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, status: MaterialStatus) -> StatusHandle {
        match self.free.pop() {
            Some(i) => {
                *self.slots[i].get_mut() = Some(status);
                StatusHandle(i)
            }
            None => {
                self.slots.push(RwLock::new(Some(status)));
                StatusHandle(self.slots.len() - 1)
            }
        }
    }

    /// Drop the status behind `h` and recycle its slot.
    pub fn release(&mut self, h: StatusHandle) -> Result<MaterialStatus, GeometryError> {
        let status = self
            .slots
            .get_mut(h.0)
            .and_then(|slot| slot.get_mut().take())
            .ok_or(GeometryError::InvalidStatusHandle(h.0))?;
        self.free.push(h.0);
        Ok(status)
    }

    /// Run `f` on a shared view of the status behind `h`.
    pub fn read<R>(
        &self,
        h: StatusHandle,
        f: impl FnOnce(&MaterialStatus) -> R,
    ) -> Result<R, GeometryError> {
        let slot = self
            .slots
            .get(h.0)
            .ok_or(GeometryError::InvalidStatusHandle(h.0))?;
        let guard = slot.read();
        guard
            .as_ref()
            .map(f)
            .ok_or(GeometryError::InvalidStatusHandle(h.0))
    }

    /// Run `f` on an exclusive view of the status behind `h`.
    pub fn write<R>(
        &self,
        h: StatusHandle,
        f: impl FnOnce(&mut MaterialStatus) -> R,
    ) -> Result<R, GeometryError> {
        let slot = self
            .slots
            .get(h.0)
            .ok_or(GeometryError::InvalidStatusHandle(h.0))?;
        let mut guard = slot.write();
        guard
            .as_mut()
            .map(f)
            .ok_or(GeometryError::InvalidStatusHandle(h.0))
    }

    /// Clone of the status behind `h`.
    pub fn snapshot(&self, h: StatusHandle) -> Result<MaterialStatus, GeometryError> {
        self.read(h, MaterialStatus::clone)
    }

    pub fn replace(&self, h: StatusHandle, status: MaterialStatus) -> Result<(), GeometryError> {
        self.write(h, |s| *s = status)
    }

    /// Number of live statuses.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_and_reset() {
        let mut s = MaterialStatus::new(3, 1);
        s.set_temp_stress(&[1.0, 2.0, 3.0]);
        s.init_temp();
        assert_eq!(s.temp_stress(), &[0.0; 3]);
        s.set_temp_stress(&[1.0, 2.0, 3.0]);
        s.commit();
        assert_eq!(s.stress(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn packed_len_matches_shape_bound() {
        let s = MaterialStatus::new(6, 2);
        assert_eq!(s.packed_len(), MaterialStatus::packed_len_for(6, 2));
        let mut buf = PackBuffer::new();
        s.pack(&mut buf);
        assert_eq!(buf.len(), s.packed_len());
    }

    #[test]
    fn store_recycles_slots() {
        let mut store = StatusStore::new();
        let a = store.allocate(MaterialStatus::new(1, 0));
        let b = store.allocate(MaterialStatus::new(1, 0));
        assert_eq!(store.len(), 2);
        store.release(a).unwrap();
        assert!(matches!(
            store.read(a, |_| ()),
            Err(GeometryError::InvalidStatusHandle(_))
        ));
        let c = store.allocate(MaterialStatus::new(3, 0));
        assert_eq!(c.index(), a.index());
        assert_eq!(store.read(c, |s| s.strain_size()).unwrap(), 3);
        store.write(b, |s| s.set_temp_strain(&[4.0])).unwrap();
        assert_eq!(store.snapshot(b).unwrap().temp_strain(), &[4.0]);
        assert!(store.release(a).is_ok());
        assert!(store.release(a).is_err());
    }
}
