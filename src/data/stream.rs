//! Generic binary data stream for persisted element context.
//!
//! All multi-byte values are little-endian. Readers fail with
//! [`GeometryError::BufferUnderflow`] instead of panicking on short input.

use crate::geometry_error::GeometryError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Sequential binary sink/source used by `save_context`/`restore_context`.
pub trait DataStream {
    fn write_u8(&mut self, v: u8);
    fn write_u32(&mut self, v: u32);
    fn write_u64(&mut self, v: u64);
    fn write_f64(&mut self, v: f64);

    fn read_u8(&mut self) -> Result<u8, GeometryError>;
    fn read_u32(&mut self) -> Result<u32, GeometryError>;
    fn read_u64(&mut self) -> Result<u64, GeometryError>;
    fn read_f64(&mut self) -> Result<f64, GeometryError>;

    /// Length-prefixed `f64` slice.
    fn write_f64_slice(&mut self, v: &[f64]) {
        self.write_u32(v.len() as u32);
        for &x in v {
            self.write_f64(x);
        }
    }

    fn read_f64_vec(&mut self) -> Result<Vec<f64>, GeometryError> {
        let n = self.read_u32()? as usize;
        (0..n).map(|_| self.read_f64()).collect()
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn read_usize(&mut self) -> Result<usize, GeometryError> {
        let v = self.read_u64()?;
        usize::try_from(v)
            .map_err(|_| GeometryError::ContextMismatch(format!("value {v} exceeds usize")))
    }
}

/// In-memory [`DataStream`]: writes append, reads consume from the front.
#[derive(Clone, Debug, Default)]
pub struct MemoryStream {
    data: BytesMut,
    pos: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream positioned at the start of previously saved bytes.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            data: BytesMut::from(&bytes[..]),
            pos: 0,
        }
    }

    /// Total bytes written.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Rewind the read cursor to the start.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    fn take(&mut self, n: usize) -> Result<&[u8], GeometryError> {
        let remaining = self.remaining();
        if remaining < n {
            return Err(GeometryError::BufferUnderflow {
                needed: n,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }
}

impl DataStream for MemoryStream {
    fn write_u8(&mut self, v: u8) {
        self.data.put_u8(v);
    }
    fn write_u32(&mut self, v: u32) {
        self.data.put_u32_le(v);
    }
    fn write_u64(&mut self, v: u64) {
        self.data.put_u64_le(v);
    }
    fn write_f64(&mut self, v: f64) {
        self.data.put_f64_le(v);
    }

    fn read_u8(&mut self) -> Result<u8, GeometryError> {
        Ok(self.take(1)?.get_u8())
    }
    fn read_u32(&mut self) -> Result<u32, GeometryError> {
        Ok(self.take(4)?.get_u32_le())
    }
    fn read_u64(&mut self) -> Result<u64, GeometryError> {
        Ok(self.take(8)?.get_u64_le())
    }
    fn read_f64(&mut self) -> Result<f64, GeometryError> {
        Ok(self.take(8)?.get_f64_le())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_roundtrip() {
        let mut s = MemoryStream::new();
        s.write_u8(7);
        s.write_u32(0xDEAD_BEEF);
        s.write_u64(u64::MAX - 1);
        s.write_f64(-2.5);
        s.write_f64_slice(&[1.0, 2.0]);
        assert_eq!(s.len(), 1 + 4 + 8 + 8 + 4 + 16);

        assert_eq!(s.read_u8().unwrap(), 7);
        assert_eq!(s.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(s.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(s.read_f64().unwrap(), -2.5);
        assert_eq!(s.read_f64_vec().unwrap(), vec![1.0, 2.0]);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn short_read_is_an_error() {
        let mut s = MemoryStream::new();
        s.write_u32(1);
        assert_eq!(
            s.read_u64(),
            Err(GeometryError::BufferUnderflow {
                needed: 8,
                remaining: 4
            })
        );
    }

    #[test]
    fn from_bytes_starts_at_front() {
        let mut w = MemoryStream::new();
        w.write_u64(99);
        let mut r = MemoryStream::from_bytes(w.into_bytes());
        assert_eq!(r.read_u64().unwrap(), 99);
    }
}
