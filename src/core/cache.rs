//! Tessellation cache implementation.
//!
//! Maps geometry hashes to triangle-mesh buffers so that structurally
//! identical shapes are tessellated once. Entries live until [`reset`]
//! is called; the cache has no size bound.
//!
//! Two distinct shapes with the same hash share one entry. Collisions are
//! not detected.
//!
//! [`reset`]: TessellationCache::reset

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::{BBox3f, Error, Result, Vec3};

use super::adapter::GeometryAdapter;

/// Content hash of a shape, used as cache key.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct GeometryHash(pub u64);

impl fmt::Display for GeometryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GeometryHash {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Triangle mesh produced by tessellation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangles as index triples into `positions`.
    pub indices: Vec<[u32; 3]>,
    /// Per-vertex normals, same length as `positions`.
    pub normals: Vec<Vec3>,
}

impl MeshBuffers {
    /// Create from raw buffers (not validated).
    pub fn new(positions: Vec<Vec3>, indices: Vec<[u32; 3]>, normals: Vec<Vec3>) -> Self {
        Self { positions, indices, normals }
    }

    /// Check the normals/positions invariant.
    pub fn validate(&self, hash: GeometryHash) -> Result<()> {
        if self.normals.len() != self.positions.len() {
            return Err(Error::NormalsMismatch {
                hash,
                positions: self.positions.len(),
                normals: self.normals.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Positions as raw bytes for GPU upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as raw bytes for GPU upload.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Flattened triangle indices as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Local bounds of the positions.
    pub fn bounds(&self) -> BBox3f {
        let mut b = BBox3f::EMPTY;
        for p in &self.positions {
            b.expand_by_point(*p);
        }
        b
    }
}

/// Counters for cache lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
}

/// Hash-keyed store of tessellation results.
///
/// Mutation needs `&mut self`, so a single owner (the scene builder)
/// is the only writer. Workers only ever see `&TessellationCache`.
#[derive(Default)]
pub struct TessellationCache {
    entries: HashMap<GeometryHash, Arc<MeshBuffers>>,
    stats: CacheStats,
}

impl TessellationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached buffers if present.
    #[inline]
    pub fn get(&self, hash: GeometryHash) -> Option<Arc<MeshBuffers>> {
        self.entries.get(&hash).map(Arc::clone)
    }

    /// Check if a hash has an entry.
    #[inline]
    pub fn contains(&self, hash: GeometryHash) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Return cached buffers for `shape`, tessellating on a miss.
    ///
    /// Fails without storing anything when the adapter breaks the
    /// normals/positions invariant.
    pub fn tessellate<A: GeometryAdapter>(
        &mut self,
        adapter: &A,
        shape: &A::Shape,
        quality: f64,
        angular_tolerance: f64,
    ) -> Result<Arc<MeshBuffers>> {
        let hash = adapter.hash(shape);
        if let Some(buffers) = self.entries.get(&hash) {
            debug!("Get object(hash={hash}) from cache");
            self.stats.hits += 1;
            return Ok(Arc::clone(buffers));
        }

        debug!("Tessellate object(hash={hash})");
        self.stats.misses += 1;
        let buffers = adapter.tessellate(shape, quality, angular_tolerance)?;
        buffers.validate(hash)?;
        Ok(self.store(hash, buffers))
    }

    /// Insert externally computed buffers (parallel merge path).
    ///
    /// An existing entry is kept; the returned `Arc` is whatever is cached.
    pub fn insert(&mut self, hash: GeometryHash, buffers: MeshBuffers) -> Result<Arc<MeshBuffers>> {
        buffers.validate(hash)?;
        if let Some(existing) = self.entries.get(&hash) {
            return Ok(Arc::clone(existing));
        }
        Ok(self.store(hash, buffers))
    }

    fn store(&mut self, hash: GeometryHash, buffers: MeshBuffers) -> Arc<MeshBuffers> {
        let buffers = Arc::new(buffers);
        self.entries.insert(hash, Arc::clone(&buffers));
        self.stats.inserts += 1;
        buffers
    }

    /// Drop every entry. Statistics are kept.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Iterate over cached hashes (unordered).
    pub fn hashes(&self) -> impl Iterator<Item = GeometryHash> + '_ {
        self.entries.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl fmt::Debug for TessellationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TessellationCache")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}
