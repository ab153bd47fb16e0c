//! Geometry kernel boundary.
//!
//! The crate never looks inside shapes. Everything it needs from the
//! kernel (hashing, tessellation, edge discretization, transfer
//! serialization) goes through [`GeometryAdapter`].

use std::path::Path;

use crate::util::{Quat, Result, Vec3};

use super::cache::{GeometryHash, MeshBuffers};

/// Operations consumed from the host geometry kernel.
///
/// Implementations must be `Send + Sync`: the parallel tessellator calls
/// `deserialize` and `tessellate` from worker threads.
pub trait GeometryAdapter: Send + Sync {
    /// Solid shape (anything that can be tessellated).
    type Shape: Send;
    /// Edge of a shape or standalone curve.
    type Edge;
    /// Standalone vertex.
    type Vertex;
    /// Placement (location) of a group or leaf.
    type Placement;

    /// Content hash. Structurally identical shapes must hash equal.
    fn hash(&self, shape: &Self::Shape) -> GeometryHash;

    /// Triangulate `shape` with the given deflection and angular tolerance.
    fn tessellate(&self, shape: &Self::Shape, quality: f64, angular_tolerance: f64) -> Result<MeshBuffers>;

    /// Sample `edge` into an ordered polyline.
    fn discretize_edge(&self, edge: &Self::Edge, accuracy: f64) -> Result<Vec<Vec3>>;

    /// Boundary edges of `shape`, used for derived edge sets.
    fn edges(&self, shape: &Self::Shape) -> Vec<Self::Edge>;

    /// Coordinate of a vertex.
    fn point(&self, vertex: &Self::Vertex) -> Vec3;

    /// Split a placement into translation and rotation.
    fn decompose_placement(&self, placement: &Self::Placement) -> (Vec3, Quat);

    /// Write `shape` to a transfer file.
    fn serialize(&self, shape: &Self::Shape, path: &Path) -> Result<()>;

    /// Read a shape back from a transfer file.
    fn deserialize(&self, path: &Path) -> Result<Self::Shape>;
}
