//! Identity and classification of mesh entities.
//!
//! - [`entity_id::EntityId`]: non-zero numbers of elements and dof managers
//! - [`element_kind::ElementKind`]: the element catalogue and its geometry
//! - [`ownership`]: parallel role and sharing partitions of an element

pub mod element_kind;
pub mod entity_id;
pub mod ownership;

pub use element_kind::{ElementGeometry, ElementKind};
pub use entity_id::EntityId;
pub use ownership::{ParallelMode, PartitionList};
