//! Utility types shared across the crate:
//! - [`Error`] / [`Result`] - Error handling
//! - [`Color`] / [`ColorSpec`] - Leaf colors
//! - Math type re-exports from glam, [`BBox3f`], [`Transform`]
//! - [`logging`] - tracing subscriber setup

mod color;
mod error;
pub mod logging;
mod math;

pub use color::*;
pub use error::*;
pub use math::*;
