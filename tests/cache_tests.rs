//! Integration tests for the tessellation cache.

mod common;

use std::sync::Arc;

use cadscene::core::{GeometryAdapter, TessellationCache};
use cadscene::Error;
use common::{Fault, MockAdapter, MockShape};

#[test]
fn test_second_lookup_reuses_buffers() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();
    let shape = MockShape::new(1);

    let first = cache.tessellate(&adapter, &shape, 0.1, 0.1).unwrap();
    let second = cache.tessellate(&adapter, &shape, 0.1, 0.1).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(adapter.probe.tessellate_calls(), 1);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.inserts), (1, 1, 1));
}

#[test]
fn test_identical_shapes_share_one_entry() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();

    // Two separate values with the same content
    let a = MockShape::new(7);
    let b = MockShape::new(7);
    assert_eq!(adapter.hash(&a), adapter.hash(&b));

    let ma = cache.tessellate(&adapter, &a, 0.1, 0.1).unwrap();
    let mb = cache.tessellate(&adapter, &b, 0.1, 0.1).unwrap();
    assert!(Arc::ptr_eq(&ma, &mb));
    assert_eq!(cache.len(), 1);
    assert_eq!(adapter.probe.tessellate_calls(), 1);
}

#[test]
fn test_distinct_shapes_get_distinct_entries() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();
    let small = MockShape::new(1);
    let large = MockShape { size: 5.0, ..MockShape::new(1) };

    let ms = cache.tessellate(&adapter, &small, 0.1, 0.1).unwrap();
    let ml = cache.tessellate(&adapter, &large, 0.1, 0.1).unwrap();

    assert!(!Arc::ptr_eq(&ms, &ml));
    assert_eq!(cache.len(), 2);
    assert_eq!(ml.bounds().max.x, 5.0);
    assert!(cache.get(adapter.hash(&large)).is_some());
}

#[test]
fn test_normals_mismatch_stores_nothing() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();
    cache.tessellate(&adapter, &MockShape::new(1), 0.1, 0.1).unwrap();

    let bad = MockShape::faulty(2, Fault::BadNormals);
    let err = cache.tessellate(&adapter, &bad, 0.1, 0.1).unwrap_err();

    assert!(matches!(err, Error::NormalsMismatch { positions: 4, normals: 3, .. }));
    assert_eq!(cache.len(), 1);
    assert!(!cache.contains(adapter.hash(&bad)));
}

#[test]
fn test_kernel_error_propagates() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();
    let err = cache
        .tessellate(&adapter, &MockShape::faulty(3, Fault::KernelError), 0.1, 0.1)
        .unwrap_err();
    assert!(matches!(err, Error::Adapter(_)));
    assert!(cache.is_empty());
}

#[test]
fn test_reset_forces_retessellation() {
    let adapter = MockAdapter::new();
    let mut cache = TessellationCache::new();
    let shape = MockShape::new(1);

    cache.tessellate(&adapter, &shape, 0.1, 0.1).unwrap();
    cache.reset();
    assert!(cache.is_empty());
    cache.tessellate(&adapter, &shape, 0.1, 0.1).unwrap();

    assert_eq!(adapter.probe.tessellate_calls(), 2);
    assert_eq!(cache.len(), 1);
}
