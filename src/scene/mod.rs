//! Scene layer - shape tree in, render tree out.
//!
//! This module provides:
//! - [`ShapeTreeNode`] / [`ShapeGroup`] / [`ShapeLeaf`] - Input tree
//! - [`RenderNode`] / [`NodePath`] - Output tree with stable paths
//! - [`IdToPathMapping`] - Shape id to render node lookup
//! - [`SceneGraphBuilder`] - The render pass driver
//! - [`RenderOptions`] - Builder settings

mod builder;
mod mapping;
mod options;
mod output;
mod render_node;
mod shape_tree;

pub use builder::{explode, SceneGraphBuilder, EDGE_GROUP_NAME, NAME_SEPARATOR};
pub use mapping::{IdToPathMapping, ShapePaths};
pub use options::RenderOptions;
pub use output::{RenderWarning, RenderedScene};
pub use render_node::{
    LineSetNode, MeshMaterial, MeshNode, NodePath, PointSetNode, PrimitiveColors, RenderNode, RenderNodeKind, Walk,
};
pub use shape_tree::{Payload, PayloadItem, PayloadKind, ShapeGroup, ShapeId, ShapeLeaf, ShapeTreeNode};
