//! Growable send buffer and consuming receive buffer for partition exchange.
//!
//! Primitives are little-endian. Reads never panic: running past the end
//! yields [`GeometryError::BufferUnderflow`].

use crate::geometry_error::GeometryError;
use bytemuck::Pod;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::mem::size_of;

/// Append-only byte buffer.
#[derive(Clone, Debug, Default)]
pub struct PackBuffer {
    buf: BytesMut,
}

impl PackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn put_pod<T: Pod>(&mut self, v: &T) {
        self.buf.put_slice(bytemuck::bytes_of(v));
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    /// `u32` length followed by the values.
    pub fn put_f64_slice(&mut self, v: &[f64]) {
        self.put_u32(v.len() as u32);
        for &x in v {
            self.put_f64(x);
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a `u32` byte-length prefix for whatever `f` appends.
    /// Returns the payload length.
    pub fn put_length_prefixed(&mut self, f: impl FnOnce(&mut PackBuffer)) -> usize {
        let at = self.buf.len();
        self.put_u32(0);
        f(self);
        let len = self.buf.len() - at - 4;
        self.buf[at..at + 4].copy_from_slice(&(len as u32).to_le_bytes());
        len
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Consuming reader over received bytes.
#[derive(Clone, Debug, Default)]
pub struct UnpackBuffer {
    buf: Bytes,
}

impl UnpackBuffer {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<(), GeometryError> {
        if self.buf.len() < needed {
            return Err(GeometryError::BufferUnderflow {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn get_pod<T: Pod>(&mut self) -> Result<T, GeometryError> {
        let n = size_of::<T>();
        self.ensure(n)?;
        let chunk = self.buf.split_to(n);
        Ok(bytemuck::pod_read_unaligned(&chunk))
    }

    pub fn get_u32(&mut self) -> Result<u32, GeometryError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn get_u64(&mut self) -> Result<u64, GeometryError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn get_f64(&mut self) -> Result<f64, GeometryError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    pub fn get_f64_vec(&mut self) -> Result<Vec<f64>, GeometryError> {
        let n = self.get_u32()? as usize;
        self.ensure(n * 8)?;
        Ok((0..n).map(|_| self.buf.get_f64_le()).collect())
    }

    /// Split off the next `n` bytes as an independent reader.
    pub fn split_to(&mut self, n: usize) -> Result<UnpackBuffer, GeometryError> {
        self.ensure(n)?;
        Ok(UnpackBuffer::new(self.buf.split_to(n)))
    }
}
