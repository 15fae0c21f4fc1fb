//! `EntityId`: a strong, zero-cost handle for domain components
//!
//! Dof managers (nodes, element sides) and elements are numbered from 1 inside
//! their owning domain. `EntityId` wraps a nonzero `u64` so that 0 stays
//! reserved as an invalid or sentinel value, and so that element-to-node
//! references can never be confused with plain counters.

use crate::geometry_error::GeometryError;
use std::{fmt, num::NonZeroU64};

/// Local (per-domain) number of a dof manager or element.
///
/// # Memory layout
/// This type is `repr(transparent)`, meaning it has the same ABI and
/// alignment as its single field (`NonZeroU64`) and can be passed on the wire
/// or to MPI exactly like a `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    ///
    /// Returns [`GeometryError::InvalidEntityId`] for `raw == 0`.
    ///
    /// ```rust
    /// # use element_geometry::topology::entity_id::EntityId;
    /// let p = EntityId::new(1).unwrap();
    /// assert_eq!(p.get(), 1);
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, GeometryError> {
        NonZeroU64::new(raw)
            .map(EntityId)
            .ok_or(GeometryError::InvalidEntityId)
    }

    /// Returns the inner `u64` value of this `EntityId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Zero-based position, for indexing dense per-domain arrays.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl TryFrom<u64> for EntityId {
    type Error = GeometryError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        EntityId::new(raw)
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.get()).finish()
    }
}

/// Prints the numeric ID without any wrapper text.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// -----------------------------------------------------------------------------
// FFI and layout guarantees
// -----------------------------------------------------------------------------

/// `EntityId` can be sent over MPI as a `u64`.
#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for EntityId {
    type Out = <u64 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        u64::equivalent_datatype()
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    // If this fails, our repr(transparent) guarantee is broken!
    assert_eq_size!(EntityId, u64);
    assert_eq_size!(Option<EntityId>, u64);
    assert_eq_align!(EntityId, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(EntityId::new(0), Err(GeometryError::InvalidEntityId));
    }

    #[test]
    fn new_get_and_index() {
        let p = EntityId::new(42).unwrap();
        assert_eq!(p.get(), 42);
        assert_eq!(p.index(), 41);
    }

    #[test]
    fn debug_and_display() {
        let p = EntityId::new(7).unwrap();
        assert_eq!(format!("{:?}", p), "EntityId(7)");
        assert_eq!(format!("{}", p), "7");
    }

    #[test]
    fn json_roundtrip() {
        let p = EntityId::new(123).unwrap();
        let s = serde_json::to_string(&p).unwrap();
        let p2: EntityId = serde_json::from_str(&s).unwrap();
        assert_eq!(p2, p);
    }

    #[test]
    fn bincode_roundtrip() {
        let p = EntityId::new(456).unwrap();
        let bytes = bincode::serialize(&p).unwrap();
        let p2: EntityId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(p2, p);
    }

    #[test]
    fn max_value() {
        let p = EntityId::new(u64::MAX).unwrap();
        assert_eq!(p.get(), u64::MAX);
    }
}
