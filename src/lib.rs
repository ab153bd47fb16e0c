//! # cadscene
//!
//! Turns a tree of CAD shapes into a render-ready scene graph.
//!
//! Solids are tessellated into triangle meshes through a content-hash
//! keyed cache, edges are discretized into line sets and vertices become
//! point sets. Every render pass also produces a mapping from shape ids to
//! the paths of their render nodes, so hosts can toggle visibility per
//! shape without rebuilding.
//!
//! The geometry kernel stays behind [`core::GeometryAdapter`].
//!
//! ## Modules
//!
//! - [`util`] - Errors, colors, math and logging
//! - [`core`] - Geometry boundary, tessellation cache, parallel tessellation
//! - [`scene`] - Shape tree, render tree and the scene builder
//!
//! ## Example
//!
//! ```ignore
//! use cadscene::prelude::*;
//!
//! let tree = ShapeGroup::new("assembly")
//!     .with_child(ShapeLeaf::solid("box", 1u64, my_box).with_color(Color::rgb(255, 0, 0)));
//! let mut builder = SceneGraphBuilder::new(MyKernel::default());
//! let scene = builder.render(&tree.into())?;
//! println!("{}", scene.root);
//! ```

pub mod util;
pub mod core;
pub mod scene;

// Re-export commonly used types
pub use util::{Error, Result};
pub use scene::{RenderOptions, RenderedScene, SceneGraphBuilder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Color, ColorSpec, Error, Quat, Result, Transform, Vec3};
    pub use crate::core::{GeometryAdapter, GeometryHash, MeshBuffers, ParallelTessellator, TessellationCache};
    pub use crate::scene::*;
}
