//! Fixed, versioned, little-endian wire types for partition exchange.

use bytemuck::{Pod, Zeroable};
use std::mem::{align_of, size_of};

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Message kind: element state blocks.
pub const KIND_ELEMENT_STATE: u16 = 1;

/// All multi-byte integers in these structs are **little-endian** on the wire.
/// We store them pre-LE with `.to_le()` and decode with `.from_le()`.

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,  // = WIRE_VERSION.to_le()
    pub kind_le: u16,     // KIND_*
    pub reserved_le: u32, // keep zero
}

impl WireHdr {
    pub fn new(kind: u16) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            reserved_le: 0,
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32, // count of following records
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// Byte length announced ahead of a variable-size message.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireSize {
    pub len_le: u64,
}

impl WireSize {
    pub fn new(len: usize) -> Self {
        Self {
            len_le: (len as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.len_le) as usize
    }
}

/// Leading record of one element's state block.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireElementHdr {
    pub global_le: u64,
    pub n_points_le: u32,
    pub reserved_le: u32,
}

impl WireElementHdr {
    pub fn new(global: u64, n_points: usize) -> Self {
        Self {
            global_le: global.to_le(),
            n_points_le: (n_points as u32).to_le(),
            reserved_le: 0,
        }
    }
    pub fn global(&self) -> u64 {
        u64::from_le(self.global_le)
    }
    pub fn n_points(&self) -> usize {
        u32::from_le(self.n_points_le) as usize
    }
}

// ===== Layout guards =======================================================

const _: () = {
    assert!(size_of::<WireHdr>() == 8);
    assert!(align_of::<WireHdr>() == 4);
    assert!(size_of::<WireCount>() == 4);
    assert!(size_of::<WireSize>() == 8);
    assert!(size_of::<WireElementHdr>() == 16);
    assert!(align_of::<WireElementHdr>() == 8);
};
