//! Input shape tree.
//!
//! The caller builds the tree once; leaf payloads are classified at
//! construction into solids, edge lists or vertex lists so the renderer
//! never has to inspect shapes at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::GeometryAdapter;
use crate::util::{ColorSpec, Error, Result};

/// Logical identity of a leaf, stable across render passes.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ShapeId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// One raw item of a leaf's shape list, tagged by the caller.
pub enum PayloadItem<A: GeometryAdapter> {
    Solid(A::Shape),
    Edge(A::Edge),
    Vertex(A::Vertex),
}

impl<A: GeometryAdapter> PayloadItem<A> {
    fn kind(&self) -> PayloadKind {
        match self {
            PayloadItem::Solid(_) => PayloadKind::Solid,
            PayloadItem::Edge(_) => PayloadKind::Edges,
            PayloadItem::Vertex(_) => PayloadKind::Vertices,
        }
    }
}

/// Classification of a leaf payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Empty,
    Solid,
    Edges,
    Vertices,
}

impl PayloadKind {
    fn item_name(self) -> &'static str {
        match self {
            PayloadKind::Empty => "empty",
            PayloadKind::Solid => "solid",
            PayloadKind::Edges => "edge",
            PayloadKind::Vertices => "vertex",
        }
    }
}

/// Classified leaf content.
pub enum Payload<A: GeometryAdapter> {
    Empty,
    Solid(A::Shape),
    Edges(Vec<A::Edge>),
    Vertices(Vec<A::Vertex>),
}

impl<A: GeometryAdapter> Payload<A> {
    /// Classify a shape list by its first element.
    ///
    /// A leading edge makes an edge list and a leading vertex a vertex
    /// list; every following item must then be of the same kind. Anything
    /// else is a solid and only the first item is rendered.
    pub fn from_items(items: Vec<PayloadItem<A>>) -> Result<Self> {
        let mut iter = items.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Payload::Empty);
        };
        match first {
            PayloadItem::Solid(shape) => Ok(Payload::Solid(shape)),
            PayloadItem::Edge(edge) => {
                let mut edges = vec![edge];
                for (i, item) in iter.enumerate() {
                    match item {
                        PayloadItem::Edge(e) => edges.push(e),
                        other => return Err(mixed(PayloadKind::Edges, other.kind(), i + 1)),
                    }
                }
                Ok(Payload::Edges(edges))
            }
            PayloadItem::Vertex(vertex) => {
                let mut vertices = vec![vertex];
                for (i, item) in iter.enumerate() {
                    match item {
                        PayloadItem::Vertex(v) => vertices.push(v),
                        other => return Err(mixed(PayloadKind::Vertices, other.kind(), i + 1)),
                    }
                }
                Ok(Payload::Vertices(vertices))
            }
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Empty => PayloadKind::Empty,
            Payload::Solid(_) => PayloadKind::Solid,
            Payload::Edges(_) => PayloadKind::Edges,
            Payload::Vertices(_) => PayloadKind::Vertices,
        }
    }

    /// True for `Empty` and for empty edge/vertex lists.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Solid(_) => false,
            Payload::Edges(edges) => edges.is_empty(),
            Payload::Vertices(vertices) => vertices.is_empty(),
        }
    }
}

fn mixed(expected: PayloadKind, found: PayloadKind, index: usize) -> Error {
    Error::MixedPayload {
        expected: expected.item_name(),
        found: found.item_name(),
        index,
    }
}

/// Renderable leaf (part, edge set or vertex set).
pub struct ShapeLeaf<A: GeometryAdapter> {
    pub name: String,
    pub id: ShapeId,
    pub color: ColorSpec,
    pub placement: Option<A::Placement>,
    pub payload: Payload<A>,
}

impl<A: GeometryAdapter> ShapeLeaf<A> {
    pub fn new(name: impl Into<String>, id: impl Into<ShapeId>, payload: Payload<A>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            color: ColorSpec::Default,
            placement: None,
            payload,
        }
    }

    pub fn solid(name: impl Into<String>, id: impl Into<ShapeId>, shape: A::Shape) -> Self {
        Self::new(name, id, Payload::Solid(shape))
    }

    pub fn edges(name: impl Into<String>, id: impl Into<ShapeId>, edges: Vec<A::Edge>) -> Self {
        Self::new(name, id, Payload::Edges(edges))
    }

    pub fn vertices(name: impl Into<String>, id: impl Into<ShapeId>, vertices: Vec<A::Vertex>) -> Self {
        Self::new(name, id, Payload::Vertices(vertices))
    }

    pub fn with_color(mut self, color: impl Into<ColorSpec>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_placement(mut self, placement: A::Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

/// Named group of shape tree nodes, optionally placed.
pub struct ShapeGroup<A: GeometryAdapter> {
    pub name: String,
    pub placement: Option<A::Placement>,
    pub children: Vec<ShapeTreeNode<A>>,
}

impl<A: GeometryAdapter> ShapeGroup<A> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placement: None,
            children: Vec::new(),
        }
    }

    pub fn with_placement(mut self, placement: A::Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Append a child, builder style.
    pub fn with_child(mut self, child: impl Into<ShapeTreeNode<A>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn push(&mut self, child: impl Into<ShapeTreeNode<A>>) {
        self.children.push(child.into());
    }
}

/// Node of the input tree.
pub enum ShapeTreeNode<A: GeometryAdapter> {
    Group(ShapeGroup<A>),
    Leaf(ShapeLeaf<A>),
}

impl<A: GeometryAdapter> ShapeTreeNode<A> {
    pub fn name(&self) -> &str {
        match self {
            ShapeTreeNode::Group(g) => &g.name,
            ShapeTreeNode::Leaf(l) => &l.name,
        }
    }

    /// Ids of all leaves, depth-first in input order.
    pub fn leaf_ids(&self) -> Vec<ShapeId> {
        let mut ids = Vec::new();
        self.visit_leaves(&mut |leaf| ids.push(leaf.id));
        ids
    }

    /// Call `f` for every leaf, depth-first in input order.
    pub fn visit_leaves<'a>(&'a self, f: &mut impl FnMut(&'a ShapeLeaf<A>)) {
        match self {
            ShapeTreeNode::Leaf(leaf) => f(leaf),
            ShapeTreeNode::Group(group) => {
                for child in &group.children {
                    child.visit_leaves(f);
                }
            }
        }
    }
}

impl<A: GeometryAdapter> From<ShapeGroup<A>> for ShapeTreeNode<A> {
    fn from(g: ShapeGroup<A>) -> Self {
        ShapeTreeNode::Group(g)
    }
}

impl<A: GeometryAdapter> From<ShapeLeaf<A>> for ShapeTreeNode<A> {
    fn from(l: ShapeLeaf<A>) -> Self {
        ShapeTreeNode::Leaf(l)
    }
}
