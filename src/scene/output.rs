//! Result of a render pass.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::BatchReport;

use super::mapping::IdToPathMapping;
use super::render_node::RenderNode;
use super::shape_tree::ShapeId;

/// Anomaly that degraded the output without aborting the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderWarning {
    /// Color list length differs from the primitive count; the first color
    /// was used for every primitive.
    ColorCountMismatch {
        shape_id: ShapeId,
        colors: usize,
        primitives: usize,
    },
    /// Two leaves share an id; the later leaf owns the mapping entry.
    DuplicateShapeId(ShapeId),
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::ColorCountMismatch { shape_id, colors, primitives } => write!(
                f,
                "shape {shape_id}: color list ({colors}) and primitive list ({primitives}) have different length, using first color for all"
            ),
            RenderWarning::DuplicateShapeId(id) => write!(f, "shape id {id} used by more than one leaf"),
        }
    }
}

/// Render tree, id mapping and diagnostics of one pass.
#[derive(Clone, Debug)]
pub struct RenderedScene {
    pub root: RenderNode,
    pub mapping: IdToPathMapping,
    pub warnings: Vec<RenderWarning>,
    /// Set when the parallel pre-pass ran.
    pub batch: Option<BatchReport>,
}

impl RenderedScene {
    /// Mesh (or point-set) node of a shape.
    pub fn mesh_node(&self, id: ShapeId) -> Option<&RenderNode> {
        let path = self.mapping.get(id)?.mesh.as_ref()?;
        self.root.find(path.as_slice())
    }

    /// Edge group of a shape.
    pub fn edge_node(&self, id: ShapeId) -> Option<&RenderNode> {
        let path = self.mapping.get(id)?.edges.as_ref()?;
        self.root.find(path.as_slice())
    }

    /// Show or hide the mesh and edges of one shape without rebuilding.
    ///
    /// Returns false if the id is not in the mapping.
    pub fn set_visibility(&mut self, id: ShapeId, mesh: bool, edges: bool) -> bool {
        let Some(paths) = self.mapping.get(id) else {
            return false;
        };
        let targets = [(paths.mesh.clone(), mesh), (paths.edges.clone(), edges)];
        for (path, visible) in targets {
            if let Some(node) = path.and_then(|p| self.root.find_mut(p.as_slice())) {
                node.visible = visible;
            }
        }
        true
    }

    /// Apply `(mesh, edges)` visibility for many shapes; returns the ids
    /// that are not in the mapping.
    pub fn apply_states(&mut self, states: &BTreeMap<ShapeId, (bool, bool)>) -> Vec<ShapeId> {
        states
            .iter()
            .filter(|(id, (mesh, edges))| !self.set_visibility(**id, *mesh, *edges))
            .map(|(id, _)| *id)
            .collect()
    }
}
