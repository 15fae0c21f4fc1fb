//! Data records an element works against: dofs, input records, time and
//! persisted streams.

pub mod dof;
pub mod record;
pub mod stream;
pub mod time;

pub use dof::{Dof, DofId, DofManager, EquationKind};
pub use record::{InputRecord, RecordValue};
pub use stream::{DataStream, MemoryStream};
pub use time::{ConstantFunction, HeavisideFunction, PiecewiseLinearFunction, TimeFunction, TimeStep};
