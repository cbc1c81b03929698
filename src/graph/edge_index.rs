//! EdgeIndex - O(1) adjacency lookups over the edge list
//!
//! Built once per run and never mutated. No validation: duplicate edge ids
//! overwrite in the id map, self-loops and parallel edges are kept and show
//! up in both adjacency lists. Adjacency lists preserve edge-list order,
//! which is what gives `${1}`, `${2}`, ... their meaning.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::node::Edge;

/// Stack-allocated edge lists: most nodes have 0-4 connections
pub type EdgeVec<'a> = SmallVec<[&'a Edge; 4]>;

/// Read-only view: by source, by target, by id
#[derive(Debug, Default)]
pub struct EdgeIndex<'a> {
    by_source: FxHashMap<&'a str, EdgeVec<'a>>,
    by_target: FxHashMap<&'a str, EdgeVec<'a>>,
    by_id: FxHashMap<&'a str, &'a Edge>,
}

impl<'a> EdgeIndex<'a> {
    pub fn build(edges: &'a [Edge]) -> Self {
        let capacity = edges.len();
        let mut index = Self {
            by_source: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            by_target: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            by_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        };

        for edge in edges {
            index
                .by_source
                .entry(edge.source.as_str())
                .or_default()
                .push(edge);
            index
                .by_target
                .entry(edge.target.as_str())
                .or_default()
                .push(edge);
            index.by_id.insert(edge.id.as_str(), edge);
        }

        index
    }

    /// Edges leaving `node_id`, in edge-list order
    #[inline]
    pub fn outgoing(&self, node_id: &str) -> &[&'a Edge] {
        self.by_source
            .get(node_id)
            .map_or(&[][..], SmallVec::as_slice)
    }

    /// Edges entering `node_id`, in edge-list order
    #[inline]
    pub fn incoming(&self, node_id: &str) -> &[&'a Edge] {
        self.by_target
            .get(node_id)
            .map_or(&[][..], SmallVec::as_slice)
    }

    #[inline]
    pub fn edge(&self, edge_id: &str) -> Option<&'a Edge> {
        self.by_id.get(edge_id).copied()
    }

    #[inline]
    pub fn in_degree(&self, node_id: &str) -> usize {
        self.incoming(node_id).len()
    }

    /// Number of distinct edge ids
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
