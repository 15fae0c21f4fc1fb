//! Mesh-level algorithms: partition exchange, adaptive mapping, assembly and
//! renumbering, plus the wire and communication layers they share.

pub mod adapt;
pub mod assembly;
pub mod comm_buffer;
pub mod communicator;
pub mod exchange;
pub mod renumber;
pub mod wire;

pub use adapt::{AdaptiveMapper, AdaptiveReport, MappingConfig, adaptive_cycle};
pub use assembly::assemble_nodal_volumes;
pub use exchange::{ExchangeReport, exchange_remote_element_data};
pub use renumber::renumber_mesh;
