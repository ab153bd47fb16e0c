//! Core layer - geometry boundary and tessellation.
//!
//! This module provides:
//! - [`GeometryAdapter`] - Operations consumed from the geometry kernel
//! - [`TessellationCache`] - Hash-keyed mesh buffers
//! - [`ParallelTessellator`] - Batch tessellation on a scoped worker pool

mod adapter;
mod cache;
mod parallel;

pub use adapter::GeometryAdapter;
pub use cache::{CacheStats, GeometryHash, MeshBuffers, TessellationCache};
pub use parallel::{default_workers, BatchReport, ParallelTessellator, SkipReason, TransferUnit, UnitResult};
