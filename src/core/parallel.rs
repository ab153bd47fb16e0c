//! Batch tessellation on a scoped worker pool.
//!
//! Every shape is handed to the workers through its own transfer file, so
//! no worker ever shares geometry with the coordinator. Workers return
//! `(hash, buffers)` units; the coordinator merges them into the cache
//! after the whole batch has finished. The cache is never written by a
//! worker.
//!
//! There is no timeout: a stalled worker blocks the batch.

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::util::{Error, Result};

use super::adapter::GeometryAdapter;
use super::cache::{GeometryHash, MeshBuffers, TessellationCache};

/// One unit of work: a serialized shape and its hash.
#[derive(Clone, Debug)]
pub struct TransferUnit {
    pub path: PathBuf,
    pub hash: GeometryHash,
}

/// Why a unit produced no buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Hash was in the cache before the batch started.
    Cached,
    /// Another unit of the same batch claimed the hash first.
    Claimed,
}

/// Worker answer for one unit. `buffers` is `None` when the unit was
/// skipped, with `skipped` telling why.
#[derive(Debug)]
pub struct UnitResult {
    pub hash: GeometryHash,
    pub buffers: Option<MeshBuffers>,
    pub skipped: Option<SkipReason>,
}

/// Outcome of one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Units dispatched to the pool.
    pub submitted: usize,
    /// Units that produced new cache entries.
    pub tessellated: usize,
    /// Units skipped, cached or claimed.
    pub skipped: usize,
    /// Skipped units whose hash another unit of the batch claimed.
    pub duplicates: usize,
}

/// Number of CPUs available to this process.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

/// Tessellates batches of shapes in parallel.
#[derive(Clone, Debug)]
pub struct ParallelTessellator {
    workers: usize,
    transfer_dir: Option<PathBuf>,
}

impl Default for ParallelTessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelTessellator {
    /// One worker per available CPU, transfer files in the OS temp dir.
    pub fn new() -> Self {
        Self {
            workers: default_workers(),
            transfer_dir: None,
        }
    }

    /// Fix the pool size (at least one worker).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Write transfer files into `dir` instead of the OS temp dir.
    pub fn with_transfer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transfer_dir = Some(dir.into());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tessellate `shapes` concurrently and merge the results into `cache`.
    ///
    /// Shapes should be distinct and uncached; duplicates are tolerated and
    /// reported as skipped. If any unit fails, nothing is merged.
    #[tracing::instrument(skip_all, fields(shapes = shapes.len(), workers = self.workers))]
    pub fn tessellate_batch<A: GeometryAdapter>(
        &self,
        adapter: &A,
        shapes: &[&A::Shape],
        cache: &mut TessellationCache,
        quality: f64,
        angular_tolerance: f64,
    ) -> Result<BatchReport> {
        if shapes.is_empty() {
            return Ok(BatchReport::default());
        }

        let units = self.write_transfer_files(adapter, shapes)?;
        let mut report = BatchReport {
            submitted: units.len(),
            ..Default::default()
        };

        let results = self.run_batch(adapter, units, cache, quality, angular_tolerance)?;

        // Single writer: merge sequentially once every worker is done.
        for result in results {
            match result.buffers {
                Some(buffers) => {
                    cache.insert(result.hash, buffers)?;
                    report.tessellated += 1;
                }
                None => {
                    report.skipped += 1;
                    if result.skipped == Some(SkipReason::Claimed) {
                        report.duplicates += 1;
                    }
                }
            }
        }

        debug!(
            "batch done: {} submitted, {} tessellated, {} skipped ({} duplicates)",
            report.submitted, report.tessellated, report.skipped, report.duplicates
        );
        Ok(report)
    }

    /// Serialize every shape to its own transfer file.
    ///
    /// On failure the files written so far are removed.
    pub fn write_transfer_files<A: GeometryAdapter>(
        &self,
        adapter: &A,
        shapes: &[&A::Shape],
    ) -> Result<Vec<TransferUnit>> {
        let mut units = Vec::with_capacity(shapes.len());
        for shape in shapes {
            match self.write_unit(adapter, shape) {
                Ok(unit) => units.push(unit),
                Err(e) => {
                    for unit in &units {
                        remove_transfer_file(&unit.path);
                    }
                    return Err(e);
                }
            }
        }
        Ok(units)
    }

    fn write_unit<A: GeometryAdapter>(&self, adapter: &A, shape: &A::Shape) -> Result<TransferUnit> {
        let dir = self.transfer_dir.clone().unwrap_or_else(std::env::temp_dir);
        let mut builder = tempfile::Builder::new();
        builder.prefix("cadscene-").suffix(".shape");
        let file = builder
            .tempfile_in(&dir)
            .map_err(|source| Error::Transfer { path: dir, source })?;

        // The TempPath deletes the file if serialization fails.
        let temp_path = file.into_temp_path();
        adapter.serialize(shape, &temp_path)?;
        let path = temp_path.keep().map_err(|e| Error::Transfer {
            path: e.path.to_path_buf(),
            source: e.error,
        })?;

        Ok(TransferUnit {
            path,
            hash: adapter.hash(shape),
        })
    }

    /// Dispatch units over a pool that lives only for this call.
    fn run_batch<A: GeometryAdapter>(
        &self,
        adapter: &A,
        units: Vec<TransferUnit>,
        cache: &TessellationCache,
        quality: f64,
        angular_tolerance: f64,
    ) -> Result<Vec<UnitResult>> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("tessellate-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                for unit in &units {
                    remove_transfer_file(&unit.path);
                }
                return Err(e.into());
            }
        };
        let claimed = Mutex::new(HashSet::new());

        let outcomes: Vec<Result<UnitResult>> = pool.install(|| {
            units
                .into_par_iter()
                .map(|unit| run_unit(adapter, unit, cache, &claimed, quality, angular_tolerance))
                .collect()
        });

        outcomes.into_iter().collect()
    }
}

/// Worker entry point. Panics are turned into [`Error::WorkerFailed`].
fn run_unit<A: GeometryAdapter>(
    adapter: &A,
    unit: TransferUnit,
    cache: &TessellationCache,
    claimed: &Mutex<HashSet<GeometryHash>>,
    quality: f64,
    angular_tolerance: f64,
) -> Result<UnitResult> {
    let hash = unit.hash;
    let path = unit.path.clone();
    panic::catch_unwind(AssertUnwindSafe(|| {
        tessellate_unit(adapter, unit, cache, claimed, quality, angular_tolerance)
    }))
    .unwrap_or_else(|payload| {
        if path.exists() {
            remove_transfer_file(&path);
        }
        Err(Error::WorkerFailed(format!("shape {hash}: {}", panic_message(payload.as_ref()))))
    })
}

fn tessellate_unit<A: GeometryAdapter>(
    adapter: &A,
    unit: TransferUnit,
    cache: &TessellationCache,
    claimed: &Mutex<HashSet<GeometryHash>>,
    quality: f64,
    angular_tolerance: f64,
) -> Result<UnitResult> {
    let TransferUnit { path, hash } = unit;
    let shape = adapter.deserialize(&path);
    remove_transfer_file(&path);
    let shape = shape?;

    if cache.contains(hash) {
        debug!("Get object(hash={hash}) from cache");
        return Ok(skipped(hash, SkipReason::Cached));
    }
    if !claimed.lock().insert(hash) {
        debug!("Object(hash={hash}) already claimed in this batch");
        return Ok(skipped(hash, SkipReason::Claimed));
    }

    debug!("Tessellate object(hash={hash})");
    let buffers = adapter.tessellate(&shape, quality, angular_tolerance)?;
    buffers.validate(hash)?;
    Ok(UnitResult {
        hash,
        buffers: Some(buffers),
        skipped: None,
    })
}

fn skipped(hash: GeometryHash, reason: SkipReason) -> UnitResult {
    UnitResult {
        hash,
        buffers: None,
        skipped: Some(reason),
    }
}

fn remove_transfer_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Cannot unlink {}: {e}", path.display());
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("Unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workers_at_least_one() {
        assert!(default_workers() >= 1);
        assert_eq!(ParallelTessellator::new().with_workers(0).workers(), 1);
        assert_eq!(ParallelTessellator::new().with_workers(3).workers(), 3);
    }

    #[test]
    fn test_remove_missing_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        remove_transfer_file(&dir.path().join("missing.shape"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown error");
    }
}
