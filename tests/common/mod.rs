//! Mock geometry kernel shared by the integration tests.
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadscene::core::{GeometryAdapter, GeometryHash, MeshBuffers};
use cadscene::util::{Error, Quat, Result, Vec3};
use serde::{Deserialize, Serialize};

/// How a mock shape misbehaves when tessellated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Fault {
    #[default]
    None,
    BadNormals,
    KernelError,
    Panic,
}

/// Quad of side `size` with `edge_count` boundary edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MockShape {
    pub key: u64,
    pub size: f32,
    pub edge_count: usize,
    pub fault: Fault,
}

impl MockShape {
    pub fn new(key: u64) -> Self {
        Self {
            key,
            size: 1.0,
            edge_count: 4,
            fault: Fault::None,
        }
    }

    pub fn faulty(key: u64, fault: Fault) -> Self {
        Self { fault, ..Self::new(key) }
    }
}

/// Polyline edge.
#[derive(Clone, Debug)]
pub struct MockEdge(pub Vec<Vec3>);

/// Straight edge along x with `points` samples (so `points - 1` segments).
pub fn edge(points: usize) -> MockEdge {
    MockEdge((0..points).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect())
}

/// Call counters, shared with clones of the adapter.
#[derive(Clone, Debug, Default)]
pub struct Probe {
    pub tessellate: Arc<AtomicUsize>,
    pub discretize: Arc<AtomicUsize>,
    pub serialize: Arc<AtomicUsize>,
    pub deserialize: Arc<AtomicUsize>,
}

impl Probe {
    pub fn tessellate_calls(&self) -> usize {
        self.tessellate.load(Ordering::SeqCst)
    }

    pub fn serialize_calls(&self) -> usize {
        self.serialize.load(Ordering::SeqCst)
    }

    pub fn deserialize_calls(&self) -> usize {
        self.deserialize.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockAdapter {
    pub probe: Probe,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeometryAdapter for MockAdapter {
    type Shape = MockShape;
    type Edge = MockEdge;
    type Vertex = Vec3;
    type Placement = Vec3;

    fn hash(&self, shape: &MockShape) -> GeometryHash {
        let mut hasher = DefaultHasher::new();
        shape.key.hash(&mut hasher);
        shape.size.to_bits().hash(&mut hasher);
        shape.edge_count.hash(&mut hasher);
        GeometryHash(hasher.finish())
    }

    fn tessellate(&self, shape: &MockShape, _quality: f64, _angular_tolerance: f64) -> Result<MeshBuffers> {
        self.probe.tessellate.fetch_add(1, Ordering::SeqCst);
        let s = shape.size;
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(s, 0.0, 0.0),
            Vec3::new(s, s, 0.0),
            Vec3::new(0.0, s, 0.0),
        ];
        let mut normals = vec![Vec3::Z; 4];
        match shape.fault {
            Fault::None => {}
            Fault::BadNormals => {
                normals.pop();
            }
            Fault::KernelError => return Err(Error::adapter(format!("cannot mesh shape {}", shape.key))),
            Fault::Panic => panic!("kernel crashed on shape {}", shape.key),
        }
        Ok(MeshBuffers::new(positions, vec![[0, 1, 2], [0, 2, 3]], normals))
    }

    fn discretize_edge(&self, edge: &MockEdge, _accuracy: f64) -> Result<Vec<Vec3>> {
        self.probe.discretize.fetch_add(1, Ordering::SeqCst);
        Ok(edge.0.clone())
    }

    fn edges(&self, shape: &MockShape) -> Vec<MockEdge> {
        (0..shape.edge_count)
            .map(|i| MockEdge(vec![Vec3::new(0.0, i as f32, 0.0), Vec3::new(shape.size, i as f32, 0.0)]))
            .collect()
    }

    fn point(&self, vertex: &Vec3) -> Vec3 {
        *vertex
    }

    fn decompose_placement(&self, placement: &Vec3) -> (Vec3, Quat) {
        (*placement, Quat::IDENTITY)
    }

    fn serialize(&self, shape: &MockShape, path: &Path) -> Result<()> {
        self.probe.serialize.fetch_add(1, Ordering::SeqCst);
        std::fs::write(path, serde_json::to_vec(shape)?)?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<MockShape> {
        self.probe.deserialize.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Files left in a transfer directory.
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}
