/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Immutable graphs with typed, weighted arcs.
//!
//! Vertices are dense indices `0..n`. Every arc carries an [`EdgeKind`] and a
//! weight; an undirected relation must be stored as two opposing arcs.
//! Parallel arcs and self-loops are kept as they are: algorithms sum their
//! weights rather than collapsing them.

use std::fmt::Display;

/// A vertex index.
pub type VertexId = usize;

/// A component identifier: the smallest vertex index of a base component.
pub type ComponentId = usize;

/// The kind of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// Two concepts denote the same entity; connected components are computed
    /// over arcs of this kind only.
    Equivalence,
    /// A taxonomic (is-a) relation.
    Hierarchy,
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Equivalence => f.write_str("equivalence"),
            EdgeKind::Hierarchy => f.write_str("hierarchy"),
        }
    }
}

/// An edge record, as provided by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub src: VertexId,
    pub dst: VertexId,
    pub kind: EdgeKind,
    pub weight: f64,
}

impl Edge {
    pub fn new(src: VertexId, dst: VertexId, kind: EdgeKind, weight: f64) -> Self {
        Self {
            src,
            dst,
            kind,
            weight,
        }
    }

    /// An equivalence edge of weight one.
    pub fn equivalence(src: VertexId, dst: VertexId) -> Self {
        Self::new(src, dst, EdgeKind::Equivalence, 1.0)
    }

    /// A hierarchy edge of weight one.
    pub fn hierarchy(src: VertexId, dst: VertexId) -> Self {
        Self::new(src, dst, EdgeKind::Hierarchy, 1.0)
    }
}

impl From<(VertexId, VertexId, EdgeKind, f64)> for Edge {
    fn from((src, dst, kind, weight): (VertexId, VertexId, EdgeKind, f64)) -> Self {
        Self::new(src, dst, kind, weight)
    }
}

/// An outgoing arc, as stored in the adjacency of its source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arc {
    pub dst: VertexId,
    pub kind: EdgeKind,
    pub weight: f64,
}

/// An immutable graph with typed, weighted arcs stored in compressed sparse
/// rows.
///
/// The successors of a vertex are returned in insertion order; arcs are never
/// deduplicated.
///
/// # Examples
///
/// ```
/// use holoma::graphs::attributed::{AttributedGraph, Edge, EdgeKind};
///
/// let g = AttributedGraph::new(
///     3,
///     [
///         Edge::equivalence(0, 1),
///         Edge::equivalence(1, 0),
///         Edge::new(1, 2, EdgeKind::Hierarchy, 0.5),
///     ],
/// );
/// assert_eq!(g.num_nodes(), 3);
/// assert_eq!(g.num_arcs(), 3);
/// assert_eq!(g.outdegree(1), 2);
/// assert_eq!(g.successors(1)[1].weight, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributedGraph {
    /// `offsets[v]..offsets[v + 1]` is the range of the arcs of `v`.
    offsets: Box<[usize]>,
    arcs: Box<[Arc]>,
}

impl Default for AttributedGraph {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl AttributedGraph {
    /// Creates a new graph with `num_nodes` vertices from a list of edges.
    ///
    /// # Panics
    ///
    /// This method will panic if an endpoint is greater than or equal to
    /// `num_nodes`.
    pub fn new(num_nodes: usize, edges: impl IntoIterator<Item = Edge>) -> Self {
        let edges = edges.into_iter().collect::<Vec<_>>();
        let mut offsets = vec![0_usize; num_nodes + 1];
        for e in &edges {
            let max = e.src.max(e.dst);
            if max >= num_nodes {
                panic!("Vertex {max} does not exist (the graph has {num_nodes} vertices)");
            }
            offsets[e.src + 1] += 1;
        }
        for v in 0..num_nodes {
            offsets[v + 1] += offsets[v];
        }

        // Counting sort by source keeps insertion order within a row
        let mut next = offsets.clone();
        let mut arcs = vec![
            Arc {
                dst: 0,
                kind: EdgeKind::Equivalence,
                weight: 0.0,
            };
            edges.len()
        ];
        for e in edges {
            arcs[next[e.src]] = Arc {
                dst: e.dst,
                kind: e.kind,
                weight: e.weight,
            };
            next[e.src] += 1;
        }

        Self {
            offsets: offsets.into_boxed_slice(),
            arcs: arcs.into_boxed_slice(),
        }
    }

    /// Creates a new graph whose number of vertices is one plus the largest
    /// endpoint of the given edges.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let edges = edges.into_iter().collect::<Vec<_>>();
        let num_nodes = edges
            .iter()
            .map(|e| e.src.max(e.dst) + 1)
            .max()
            .unwrap_or(0);
        Self::new(num_nodes, edges)
    }

    /// Creates a graph with `num_nodes` vertices and no arcs.
    pub fn empty(num_nodes: usize) -> Self {
        Self::new(num_nodes, std::iter::empty::<Edge>())
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline(always)]
    pub fn num_arcs(&self) -> u64 {
        self.arcs.len() as u64
    }

    /// Returns the outgoing arcs of `v`.
    ///
    /// # Panics
    ///
    /// This method will panic if `v` is not a vertex of the graph.
    #[inline(always)]
    pub fn successors(&self, v: VertexId) -> &[Arc] {
        &self.arcs[self.offsets[v]..self.offsets[v + 1]]
    }

    /// Returns the outgoing arcs of `v` of the given kind.
    pub fn successors_of_kind(
        &self,
        v: VertexId,
        kind: EdgeKind,
    ) -> impl Iterator<Item = &Arc> + '_ {
        self.successors(v).iter().filter(move |arc| arc.kind == kind)
    }

    #[inline(always)]
    pub fn outdegree(&self, v: VertexId) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Returns an iterator over all edges, in source order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.num_nodes()).flat_map(move |src| {
            self.successors(src)
                .iter()
                .map(move |arc| Edge::new(src, arc.dst, arc.kind, arc.weight))
        })
    }

    /// Returns the subgraph containing all vertices and only the arcs of the
    /// given kind.
    ///
    /// No reciprocal arcs are synthesized.
    pub fn restrict(&self, kind: EdgeKind) -> Self {
        Self::new(self.num_nodes(), self.edges().filter(|e| e.kind == kind))
    }
}
