//! Convert a shape tree into a render tree.
//!
//! A render pass walks the tree depth-first in input order. Groups become
//! group nodes, leaves become up to three sub-nodes appended to their
//! parent group in the order mesh, edge group, points. Solids go through
//! the tessellation cache; in parallel mode every uncached solid is
//! tessellated in one batch before the walk starts.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use crate::core::{default_workers, BatchReport, GeometryAdapter, ParallelTessellator, TessellationCache};
use crate::util::{Color, ColorSpec, Result, Transform, Vec3};

use super::mapping::{IdToPathMapping, ShapePaths};
use super::options::RenderOptions;
use super::output::{RenderWarning, RenderedScene};
use super::render_node::{
    LineSetNode, MeshMaterial, MeshNode, NodePath, PointSetNode, PrimitiveColors, RenderNode, RenderNodeKind,
};
use super::shape_tree::{Payload, ShapeGroup, ShapeId, ShapeLeaf, ShapeTreeNode};

/// Name of the group holding a leaf's line set.
pub const EDGE_GROUP_NAME: &str = "edges";

/// Separator between parent and child in qualified group names.
pub const NAME_SEPARATOR: char = '>';

/// Builds render trees and owns the tessellation cache shared by all
/// passes of this builder.
pub struct SceneGraphBuilder<A: GeometryAdapter> {
    adapter: A,
    options: RenderOptions,
    cache: TessellationCache,
}

impl<A: GeometryAdapter> SceneGraphBuilder<A> {
    /// Builder with default options and an empty cache.
    pub fn new(adapter: A) -> Self {
        Self::with_options(adapter, RenderOptions::default())
    }

    pub fn with_options(adapter: A, options: RenderOptions) -> Self {
        Self {
            adapter,
            options,
            cache: TessellationCache::new(),
        }
    }

    /// Start from an existing cache.
    pub fn with_cache(mut self, cache: TessellationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RenderOptions {
        &mut self.options
    }

    pub fn cache(&self) -> &TessellationCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TessellationCache {
        &mut self.cache
    }

    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    pub fn into_cache(self) -> TessellationCache {
        self.cache
    }

    /// Run one render pass.
    ///
    /// Adapter failures abort the pass; the cache keeps every entry that
    /// was completely added before the failure.
    #[tracing::instrument(skip_all, fields(root = tree.name()))]
    pub fn render(&mut self, tree: &ShapeTreeNode<A>) -> Result<RenderedScene> {
        self.options.validate()?;
        let timer = Stopwatch::start(self.options.timeit);

        let batch = if self.options.parallel && self.options.render_shapes {
            let timer = Stopwatch::start(self.options.timeit);
            let report = self.pre_tessellate(tree)?;
            timer.stop(|| "parallel tessellation time".into());
            Some(report)
        } else {
            None
        };

        let mut pass = RenderPass {
            adapter: &self.adapter,
            options: &self.options,
            cache: &mut self.cache,
            mapping: IdToPathMapping::new(),
            warnings: Vec::new(),
        };

        let root = match tree {
            ShapeTreeNode::Group(group) => pass.render_group(group, NodePath::root(), "")?,
            ShapeTreeNode::Leaf(leaf) => {
                let mut root = RenderNode::group(NodePath::root(), "", Transform::IDENTITY);
                pass.render_leaf(leaf, &mut root)?;
                root
            }
        };

        timer.stop(|| "overall render time".into());
        Ok(RenderedScene {
            root,
            mapping: pass.mapping,
            warnings: pass.warnings,
            batch,
        })
    }

    /// Tessellate every distinct uncached solid of `tree` in one batch.
    fn pre_tessellate(&mut self, tree: &ShapeTreeNode<A>) -> Result<BatchReport> {
        let mut seen = HashSet::new();
        let mut shapes = Vec::new();
        tree.visit_leaves(&mut |leaf| {
            if let Payload::Solid(shape) = &leaf.payload {
                let hash = self.adapter.hash(shape);
                if !self.cache.contains(hash) && seen.insert(hash) {
                    shapes.push(shape);
                }
            }
        });
        debug!("parallel pre-pass: {} distinct uncached solids", shapes.len());

        let mut tessellator =
            ParallelTessellator::new().with_workers(self.options.workers.unwrap_or_else(default_workers));
        if let Some(dir) = &self.options.transfer_dir {
            tessellator = tessellator.with_transfer_dir(dir);
        }
        tessellator.tessellate_batch(
            &self.adapter,
            &shapes,
            &mut self.cache,
            self.options.quality,
            self.options.angular_tolerance,
        )
    }
}

/// Content produced for one leaf.
#[derive(Default)]
struct LeafContent {
    mesh: Option<MeshNode>,
    edges: Option<LineSetNode>,
    points: Option<PointSetNode>,
}

/// State of one render pass.
struct RenderPass<'a, A: GeometryAdapter> {
    adapter: &'a A,
    options: &'a RenderOptions,
    cache: &'a mut TessellationCache,
    mapping: IdToPathMapping,
    warnings: Vec<RenderWarning>,
}

impl<A: GeometryAdapter> RenderPass<'_, A> {
    fn render_group(&mut self, group: &ShapeGroup<A>, path: NodePath, prefix: &str) -> Result<RenderNode> {
        // Qualified as `parent>child` below the root.
        let name = if prefix.is_empty() {
            group.name.clone()
        } else {
            format!("{prefix}{NAME_SEPARATOR}{}", group.name)
        };
        let transform = self.placement(group.placement.as_ref());
        let mut node = RenderNode::group(path, name, transform);

        for child in &group.children {
            match child {
                ShapeTreeNode::Leaf(leaf) => self.render_leaf(leaf, &mut node)?,
                ShapeTreeNode::Group(sub) => {
                    let sub_path = node.path().child(node.child_count());
                    let sub_node = self.render_group(sub, sub_path, &node.name)?;
                    node.push_child(sub_node);
                }
            }
        }
        Ok(node)
    }

    fn render_leaf(&mut self, leaf: &ShapeLeaf<A>, parent: &mut RenderNode) -> Result<()> {
        let timer = Stopwatch::start(self.options.timeit);
        let content = self.render_shape(leaf)?;
        let transform = self.placement(leaf.placement.as_ref());
        let mut paths = ShapePaths::default();

        if let Some(mesh) = content.mesh {
            let path = parent.path().child(parent.child_count());
            parent.push_child(RenderNode::new(path.clone(), leaf.name.clone(), transform, RenderNodeKind::Mesh(mesh)));
            paths.mesh = Some(path);
        }

        if let Some(lines) = content.edges {
            let path = parent.path().child(parent.child_count());
            let mut edge_group = RenderNode::group(path.clone(), EDGE_GROUP_NAME, Transform::IDENTITY);
            edge_group.push_child(RenderNode::new(
                path.child(0),
                leaf.name.clone(),
                transform,
                RenderNodeKind::LineSet(lines),
            ));
            parent.push_child(edge_group);
            paths.edges = Some(path);
        }

        if let Some(points) = content.points {
            let path = parent.path().child(parent.child_count());
            parent.push_child(RenderNode::new(path.clone(), leaf.name.clone(), transform, RenderNodeKind::PointSet(points)));
            paths.mesh = Some(path);
        }

        if self.mapping.insert(leaf.id, paths) {
            warn!("shape id {} used by more than one leaf", leaf.id);
            self.warnings.push(RenderWarning::DuplicateShapeId(leaf.id));
        }
        timer.stop(|| format!("render shape {:30} time", leaf.name));
        Ok(())
    }

    fn render_shape(&mut self, leaf: &ShapeLeaf<A>) -> Result<LeafContent> {
        let mut content = LeafContent::default();
        if leaf.payload.is_empty() {
            debug!("shape {} '{}' has an empty payload", leaf.id, leaf.name);
            return Ok(content);
        }

        match &leaf.payload {
            Payload::Empty => {}
            Payload::Edges(edges) => {
                content.edges = Some(self.line_set(leaf.id, edges, &leaf.color, self.options.edge_width)?);
            }
            Payload::Vertices(vertices) => {
                content.points = Some(self.point_set(leaf.id, vertices, &leaf.color));
            }
            Payload::Solid(shape) => {
                if self.options.render_shapes {
                    let buffers =
                        self.cache
                            .tessellate(self.adapter, shape, self.options.quality, self.options.angular_tolerance)?;
                    content.mesh = Some(MeshNode {
                        shape_id: leaf.id,
                        buffers,
                        material: MeshMaterial {
                            color: self.solid_color(leaf.id, &leaf.color),
                            transparent: self.options.transparent,
                            opacity: self.options.opacity,
                        },
                    });
                }
                if self.options.render_edges {
                    let edges = self.adapter.edges(shape);
                    let color = ColorSpec::Single(self.options.default_edge_color);
                    content.edges = Some(self.line_set(leaf.id, &edges, &color, self.options.derived_edge_width)?);
                }
            }
        }
        Ok(content)
    }

    fn line_set(&mut self, id: ShapeId, edges: &[A::Edge], color: &ColorSpec, width: f32) -> Result<LineSetNode> {
        let mut segments = Vec::new();
        let mut counts = Vec::with_capacity(edges.len());
        for edge in edges {
            let polyline = self.adapter.discretize_edge(edge, self.options.edge_accuracy)?;
            let before = segments.len();
            explode_into(&polyline, &mut segments);
            counts.push(segments.len() - before);
        }
        let colors = self.primitive_colors(id, color, &counts, self.options.default_edge_color);
        Ok(LineSetNode {
            shape_id: id,
            segments,
            colors,
            width,
        })
    }

    fn point_set(&mut self, id: ShapeId, vertices: &[A::Vertex], color: &ColorSpec) -> PointSetNode {
        let points: Vec<Vec3> = vertices.iter().map(|v| self.adapter.point(v)).collect();
        let counts = vec![1; points.len()];
        // Vertices share the edge color default.
        let colors = self.primitive_colors(id, color, &counts, self.options.default_edge_color);
        PointSetNode {
            shape_id: id,
            points,
            colors,
            size: self.options.vertex_size,
        }
    }

    /// Resolve colors for primitives producing `counts[i]` render items
    /// each (segments per edge, one per vertex).
    fn primitive_colors(&mut self, id: ShapeId, spec: &ColorSpec, counts: &[usize], default: Color) -> PrimitiveColors {
        match spec {
            ColorSpec::Default => PrimitiveColors::Uniform(default),
            ColorSpec::Single(c) => PrimitiveColors::Uniform(*c),
            ColorSpec::PerPrimitive(list) if list.len() == counts.len() => PrimitiveColors::PerPrimitive(
                list.iter()
                    .zip(counts)
                    .flat_map(|(c, n)| std::iter::repeat(*c).take(*n))
                    .collect(),
            ),
            ColorSpec::PerPrimitive(list) => {
                self.color_mismatch(id, list.len(), counts.len());
                PrimitiveColors::Uniform(list.first().copied().unwrap_or(default))
            }
        }
    }

    fn solid_color(&mut self, id: ShapeId, spec: &ColorSpec) -> Color {
        match spec {
            ColorSpec::Default => self.options.default_mesh_color,
            ColorSpec::Single(c) => *c,
            ColorSpec::PerPrimitive(list) => {
                if list.len() != 1 {
                    self.color_mismatch(id, list.len(), 1);
                }
                list.first().copied().unwrap_or(self.options.default_mesh_color)
            }
        }
    }

    fn color_mismatch(&mut self, id: ShapeId, colors: usize, primitives: usize) {
        let warning = RenderWarning::ColorCountMismatch {
            shape_id: id,
            colors,
            primitives,
        };
        warn!("{warning}");
        self.warnings.push(warning);
    }

    fn placement(&self, placement: Option<&A::Placement>) -> Transform {
        placement
            .map(|p| {
                let (translation, rotation) = self.adapter.decompose_placement(p);
                Transform::new(translation, rotation)
            })
            .unwrap_or_default()
    }
}

/// Split a polyline into consecutive point pairs.
pub fn explode(polyline: &[Vec3]) -> Vec<[Vec3; 2]> {
    let mut out = Vec::with_capacity(polyline.len().saturating_sub(1));
    explode_into(polyline, &mut out);
    out
}

fn explode_into(polyline: &[Vec3], out: &mut Vec<[Vec3; 2]>) {
    out.extend(polyline.windows(2).map(|w| [w[0], w[1]]));
}

/// Phase timer, logs at info level when enabled.
struct Stopwatch(Option<Instant>);

impl Stopwatch {
    fn start(enabled: bool) -> Self {
        Self(enabled.then(Instant::now))
    }

    /// `msg` is only built when timing is enabled.
    fn stop(self, msg: impl FnOnce() -> String) {
        if let Some(start) = self.0 {
            let msg = msg();
            let _span = info_span!("timeit").entered();
            info!("{msg:>20}: {} ms", start.elapsed().as_millis());
        }
    }
}
