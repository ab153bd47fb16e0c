//! Logical shape id to render-tree location.

use std::collections::BTreeMap;

use super::render_node::NodePath;
use super::shape_tree::ShapeId;

/// Where a leaf's content ended up.
///
/// `mesh` holds the mesh path (or the point-set path for vertex leaves),
/// `edges` the path of the leaf's edge group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapePaths {
    pub mesh: Option<NodePath>,
    pub edges: Option<NodePath>,
}

impl ShapePaths {
    /// Nothing was rendered for this leaf.
    pub fn is_empty(&self) -> bool {
        self.mesh.is_none() && self.edges.is_none()
    }
}

/// Mapping built by one render pass; one entry per leaf id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdToPathMapping {
    entries: BTreeMap<ShapeId, ShapePaths>,
}

impl IdToPathMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns true if the id was already present.
    pub(crate) fn insert(&mut self, id: ShapeId, paths: ShapePaths) -> bool {
        self.entries.insert(id, paths).is_some()
    }

    #[inline]
    pub fn get(&self, id: ShapeId) -> Option<&ShapePaths> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entries ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &ShapePaths)> {
        self.entries.iter().map(|(id, p)| (*id, p))
    }

    pub fn ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut mapping = IdToPathMapping::new();
        assert!(!mapping.insert(ShapeId(3), ShapePaths::default()));
        let paths = ShapePaths {
            mesh: Some(NodePath::root().child(0)),
            edges: None,
        };
        assert!(mapping.insert(ShapeId(3), paths.clone()));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(ShapeId(3)), Some(&paths));
    }

    #[test]
    fn test_iter_ordered_by_id() {
        let mut mapping = IdToPathMapping::new();
        for id in [5u64, 1, 3] {
            mapping.insert(ShapeId(id), ShapePaths::default());
        }
        let ids: Vec<u64> = mapping.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(mapping.iter().all(|(_, p)| p.is_empty()));
    }
}
