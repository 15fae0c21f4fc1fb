//! GeometryError: unified error type for element-geometry public APIs
//!
//! Every variant is a structural or configuration failure. Callers are expected
//! to abort the run when one surfaces; soft query failures ("value not
//! available", "no spatial source found") are reported through return values
//! instead and never appear here.

use crate::data::dof::DofId;
use crate::topology::entity_id::EntityId;
use thiserror::Error;

/// Unified error type for element-geometry operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// Attempted to construct an EntityId with a zero value (invalid).
    #[error("EntityId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidEntityId,
    /// The element requested a dof that its dof manager does not carry.
    #[error("element {element}: dof manager {dof_manager} has no dof {dof:?}")]
    MissingDof {
        element: EntityId,
        dof_manager: EntityId,
        dof: DofId,
    },
    /// A dof-manager reference did not resolve in the owning domain.
    #[error("element {element}: dof manager {dof_manager} is not defined in the domain")]
    UnknownDofManager {
        element: EntityId,
        dof_manager: EntityId,
    },
    /// The attached dof-manager list does not match the element kind.
    #[error("element {element}: expected {expected} dof managers, got {found}")]
    DofManagerCountMismatch {
        element: EntityId,
        expected: usize,
        found: usize,
    },
    /// Two elements of one mesh share a local number.
    #[error("element {0} is already defined in the mesh")]
    DuplicateElement(EntityId),
    /// Local dof-manager index outside `1..=count`.
    #[error("element {element}: local dof manager index {index} out of range 1..={count}")]
    LocalIndexOutOfRange {
        element: EntityId,
        index: usize,
        count: usize,
    },
    #[error("material {0} is not defined in the domain")]
    UnknownMaterial(usize),
    #[error("cross section {0} is not defined in the domain")]
    UnknownCrossSection(usize),
    #[error("time function {0} is not defined in the domain")]
    UnknownTimeFunction(usize),
    /// Missing mandatory key or value of the wrong shape in an input record.
    #[error("malformed input record, key `{key}`: {reason}")]
    MalformedRecord { key: &'static str, reason: String },
    /// An integration-point reference does not address a point of this element.
    #[error("element {element}: no integration point {index} in rule {rule}")]
    InvalidIntegrationPoint {
        element: EntityId,
        rule: usize,
        index: usize,
    },
    /// Requested integration scheme is not available for the geometry.
    #[error("unsupported integration: {0}")]
    UnsupportedIntegration(String),
    /// Degenerate or otherwise unusable element geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Packed and unpacked partition data disagree (point count, id, size).
    #[error("protocol desync: {0}")]
    ProtocolDesync(String),
    /// A reader ran past the end of a communication buffer or stream.
    #[error("buffer underflow: needed {needed} bytes, {remaining} remaining")]
    BufferUnderflow { needed: usize, remaining: usize },
    /// A persisted context does not fit the element it is restored into.
    #[error("context mismatch: {0}")]
    ContextMismatch(String),
    /// Operation not permitted in the element's current lifecycle state.
    #[error("element {element}: `{operation}` not permitted while {state}")]
    InvalidLifecycle {
        element: EntityId,
        operation: &'static str,
        state: &'static str,
    },
    /// The renumbering function left a reference unmapped.
    #[error("element {element}: renumbering left {what} {old} unmapped")]
    RenumberingFailed {
        element: EntityId,
        what: &'static str,
        old: u64,
    },
    /// Mesh-level renumbering maps two entities onto one number.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
    /// A material-state handle does not address a live status slot.
    #[error("material status handle {0} is not allocated")]
    InvalidStatusHandle(usize),
    /// Communication with a neighbour failed.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
    #[error("i/o failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e.to_string())
    }
}
