mod actor;
mod ai;
mod behavior;
mod config;
mod engine;
mod error;
mod level;
mod order;
mod registry;
mod resolver;
mod sync;
mod validate;
mod visibility;

#[cfg(test)]
mod test_support;

pub use crate::actor::*;
pub use crate::config::*;
pub use crate::engine::*;
pub use crate::error::*;
pub use crate::level::*;
pub use crate::order::*;
pub use crate::registry::*;
pub use crate::resolver::Submission;
pub use crate::sync::diff;
pub use crate::validate::*;
pub use crate::visibility::{cast_field_of_view, degrade_highlighted, VisionPass, DEFAULT_RANGE_SOV};

pub use murmures_protocol as protocol;
