#![cfg_attr(docsrs, feature(doc_cfg))]
//! # element-geometry
//!
//! element-geometry is the element layer of a structural finite-element code:
//! the per-element aggregate that ties dof managers, material and cross
//! section references, and integration rules together, plus the machinery that
//! moves integration-point state around during a parallel, adaptive analysis.
//!
//! ## Features
//! - [`element::ElementEntity`] with its lifecycle, dof bookkeeping, volume and
//!   coordinate queries, persisted context and renumbering
//! - One ordered traversal over integration points ([`integration::IpTraversal`])
//!   shared by volume integration, state commit, serialization and mapping
//! - Partition exchange of remote element mirrors over pluggable communication
//!   backends (threads, MPI)
//! - Adaptive transfer of history variables from an old mesh to a new one with a
//!   nearest-element fallback
//!
//! ## Determinism
//!
//! Integration points are always visited rule by rule, point by point. Wire
//! blocks and status commits follow that order, so two ranks that built the same
//! element agree on the layout of its state without further negotiation.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! element-geometry = "0.3"
//! # Optional features:
//! # features = ["rayon", "mpi-support"]
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod element;
pub mod geometry;
pub mod geometry_error;
pub mod integration;
pub mod material;
pub mod mesh;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use geometry_error::GeometryError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::adapt::{AdaptiveMapper, MappingConfig, adaptive_cycle};
    pub use crate::algs::communicator::{
        CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait,
    };
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::exchange::exchange_remote_element_data;
    pub use crate::data::dof::{DofId, DofManager, EquationKind};
    pub use crate::data::record::{InputRecord, RecordValue};
    pub use crate::data::stream::{DataStream, MemoryStream};
    pub use crate::data::time::{TimeFunction, TimeStep};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::element::{ElementEntity, LifecycleState, MappingOutcome};
    pub use crate::geometry_error::GeometryError;
    pub use crate::integration::{IpRef, IpTraversal};
    pub use crate::material::{
        CrossSection, InternalStateType, LinearElasticMaterial, Material, MaterialMode,
        SimpleCrossSection,
    };
    pub use crate::mesh::{Domain, Mesh};
    pub use crate::topology::element_kind::{ElementGeometry, ElementKind};
    pub use crate::topology::entity_id::EntityId;
    pub use crate::topology::ownership::{ParallelMode, PartitionList};
}
