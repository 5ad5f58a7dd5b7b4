mod delta;
mod ids;
mod order;
mod report;
mod snapshot;
mod types;
pub mod wire;

pub use crate::delta::*;
pub use crate::ids::*;
pub use crate::order::*;
pub use crate::report::*;
pub use crate::snapshot::*;
pub use crate::types::*;
