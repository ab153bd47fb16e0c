//! Render tree produced by a render pass.
//!
//! Every node carries the path it was created at: the sibling indices
//! from the root down to the node. Paths never change after construction,
//! so a path recorded in the id mapping keeps addressing the same node.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::MeshBuffers;
use crate::util::{BBox3f, Color, Mat4, Transform, Vec3};

use super::shape_tree::ShapeId;

/// Sibling indices locating a node from the root. The root path is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(SmallVec<[usize; 8]>);

impl NodePath {
    /// Path of the root group.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the child at `index` below this path.
    pub fn child(&self, index: usize) -> Self {
        let mut p = self.clone();
        p.0.push(index);
        p
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Depth below the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[usize]> for NodePath {
    fn from(s: &[usize]) -> Self {
        Self(SmallVec::from_slice(s))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{idx}")?;
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

/// Colors of a line or point set.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveColors {
    /// One color for every primitive.
    Uniform(Color),
    /// One color per segment or point.
    PerPrimitive(Vec<Color>),
}

/// Surface material of a mesh node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshMaterial {
    pub color: Color,
    pub transparent: bool,
    pub opacity: f32,
}

/// Indexed triangle mesh.
#[derive(Clone, Debug)]
pub struct MeshNode {
    pub shape_id: ShapeId,
    /// Shared with the tessellation cache.
    pub buffers: Arc<MeshBuffers>,
    pub material: MeshMaterial,
}

/// Line segments (pairs of points).
#[derive(Clone, Debug)]
pub struct LineSetNode {
    pub shape_id: ShapeId,
    pub segments: Vec<[Vec3; 2]>,
    pub colors: PrimitiveColors,
    pub width: f32,
}

/// Point cloud.
#[derive(Clone, Debug)]
pub struct PointSetNode {
    pub shape_id: ShapeId,
    pub points: Vec<Vec3>,
    pub colors: PrimitiveColors,
    pub size: f32,
}

/// Content of a render node.
#[derive(Clone, Debug)]
pub enum RenderNodeKind {
    Group(Vec<RenderNode>),
    Mesh(MeshNode),
    LineSet(LineSetNode),
    PointSet(PointSetNode),
}

/// Node of the render tree.
#[derive(Clone, Debug)]
pub struct RenderNode {
    path: NodePath,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: RenderNodeKind,
}

impl RenderNode {
    pub(crate) fn new(path: NodePath, name: impl Into<String>, transform: Transform, kind: RenderNodeKind) -> Self {
        Self {
            path,
            name: name.into(),
            transform,
            visible: true,
            kind,
        }
    }

    pub(crate) fn group(path: NodePath, name: impl Into<String>, transform: Transform) -> Self {
        Self::new(path, name, transform, RenderNodeKind::Group(Vec::new()))
    }

    /// Append a child to a group node. The child's path must already be
    /// `self.path().child(self.child_count())`.
    pub(crate) fn push_child(&mut self, child: RenderNode) {
        debug_assert_eq!(child.path, self.path.child(self.child_count()));
        if let RenderNodeKind::Group(children) = &mut self.kind {
            children.push(child);
        }
    }

    /// Path assigned at construction.
    #[inline]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, RenderNodeKind::Group(_))
    }

    /// Children of a group; empty for leaf content.
    pub fn children(&self) -> &[RenderNode] {
        match &self.kind {
            RenderNodeKind::Group(children) => children,
            _ => &[],
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Originating shape of leaf content.
    pub fn shape_id(&self) -> Option<ShapeId> {
        match &self.kind {
            RenderNodeKind::Group(_) => None,
            RenderNodeKind::Mesh(m) => Some(m.shape_id),
            RenderNodeKind::LineSet(l) => Some(l.shape_id),
            RenderNodeKind::PointSet(p) => Some(p.shape_id),
        }
    }

    /// Resolve a path relative to this node.
    pub fn find(&self, path: &[usize]) -> Option<&RenderNode> {
        let mut node = self;
        for &idx in path {
            node = node.children().get(idx)?;
        }
        Some(node)
    }

    pub fn find_mut(&mut self, path: &[usize]) -> Option<&mut RenderNode> {
        let mut node = self;
        for &idx in path {
            let current = node;
            node = match &mut current.kind {
                RenderNodeKind::Group(children) => children.get_mut(idx)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// First group (depth-first) with the given qualified name.
    pub fn find_group(&self, name: &str) -> Option<&RenderNode> {
        self.walk().find(|n| n.is_group() && n.name == name)
    }

    /// Depth-first pre-order iterator over this node and its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// World-space bounds of all content below this node.
    pub fn bounds(&self) -> BBox3f {
        let mut out = BBox3f::EMPTY;
        self.expand_bounds(Mat4::IDENTITY, &mut out);
        out
    }

    fn expand_bounds(&self, parent: Mat4, out: &mut BBox3f) {
        let m = parent * self.transform.matrix();
        match &self.kind {
            RenderNodeKind::Group(children) => {
                for child in children {
                    child.expand_bounds(m, out);
                }
            }
            RenderNodeKind::Mesh(mesh) => out.expand_by_box(&mesh.buffers.bounds().transformed(m)),
            RenderNodeKind::LineSet(lines) => {
                for p in lines.segments.iter().flatten() {
                    out.expand_by_point(m.transform_point3(*p));
                }
            }
            RenderNodeKind::PointSet(points) => {
                for p in &points.points {
                    out.expand_by_point(m.transform_point3(*p));
                }
            }
        }
    }

    /// Indented outline of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let label = match &self.kind {
            RenderNodeKind::Group(_) => "Group".to_string(),
            RenderNodeKind::Mesh(m) => format!("Mesh[{} tris]", m.buffers.triangle_count()),
            RenderNodeKind::LineSet(l) => format!("LineSet[{} segs]", l.segments.len()),
            RenderNodeKind::PointSet(p) => format!("PointSet[{} pts]", p.points.len()),
        };
        out.push_str(&format!("{indent}{label} '{}' {}", self.name, self.path));
        if !self.visible {
            out.push_str(" hidden");
        }
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }
}

impl fmt::Display for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// Iterator returned by [`RenderNode::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a RenderNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a RenderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
