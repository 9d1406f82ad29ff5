/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Connected components of the equivalence relation.
//!
//! Components are computed by [label propagation](label_propagation) over
//! the arcs of kind
//! [`Equivalence`](holoma::graphs::attributed::EdgeKind::Equivalence); every component is
//! identified by the smallest index of its members. The resulting
//! [`Components`] can be [filtered by size](Components::filter_by_size),
//! obtaining the [`BaseComponents`] that seed the
//! [enrichment](crate::enrichment).
//!
//! # Examples
//! ```
//! # fn main() -> anyhow::Result<()> {
//! use dsi_progress_logger::no_logging;
//! use holoma::graphs::attributed::{AttributedGraph, Edge};
//! use holoma::utils::Granularity;
//! use holoma_algo::components::*;
//!
//! let graph = AttributedGraph::new(
//!     5,
//!     [
//!         Edge::equivalence(0, 1),
//!         Edge::equivalence(1, 0),
//!         Edge::equivalence(3, 4),
//!         Edge::equivalence(4, 3),
//!         Edge::hierarchy(1, 3),
//!     ],
//! );
//!
//! let components = label_propagation(&graph, 10, Granularity::default(), no_logging![])?;
//! assert_eq!(components.labels(), &[0, 0, 2, 3, 3]);
//!
//! let base = components.filter_by_size(1, 10, true);
//! assert_eq!(base.ids().collect::<Vec<_>>(), vec![0, 3]);
//! #     Ok(())
//! # }
//! ```

mod label_prop;
pub use label_prop::*;

mod stats;
pub use stats::*;

use holoma::graphs::attributed::{ComponentId, VertexId};
use std::collections::BTreeMap;

/// Connected components.
///
/// An instance of this structure stores the [label](Components::labels) of
/// each vertex, that is, the smallest index of a vertex in the same
/// component.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Components {
    labels: Box<[ComponentId]>,
}

impl Components {
    pub fn new(labels: Box<[ComponentId]>) -> Self {
        Components { labels }
    }

    /// Returns a slice containing, for each vertex, the identifier of its
    /// component.
    pub fn labels(&self) -> &[ComponentId] {
        &self.labels
    }

    pub fn component_of(&self, v: VertexId) -> ComponentId {
        self.labels[v]
    }

    /// Returns the number of distinct components.
    pub fn num_components(&self) -> usize {
        self.compute_sizes().len()
    }

    /// Returns the size of each component.
    pub fn compute_sizes(&self) -> BTreeMap<ComponentId, usize> {
        let mut sizes = BTreeMap::new();
        for &label in self.labels.iter() {
            *sizes.entry(label).or_insert(0) += 1;
        }
        sizes
    }

    /// Returns the members of each component, sorted by index.
    pub fn sets(&self) -> BTreeMap<ComponentId, Vec<VertexId>> {
        let mut sets = BTreeMap::<_, Vec<_>>::new();
        for (v, &label) in self.labels.iter().enumerate() {
            sets.entry(label).or_default().push(v);
        }
        sets
    }

    /// Returns the components whose size is in `[min, max]`; if
    /// `drop_singletons` is true, components of size one are discarded, too.
    pub fn filter_by_size(&self, min: usize, max: usize, drop_singletons: bool) -> BaseComponents {
        let mut sets = self.sets();
        sets.retain(|_, members| {
            (min..=max).contains(&members.len()) && !(drop_singletons && members.len() == 1)
        });
        log::info!(
            "Kept {} components of size in [{min} . . {max}] out of {}",
            sets.len(),
            self.num_components()
        );
        BaseComponents::new(sets)
    }

    pub fn stats(&self) -> ComponentStats {
        ComponentStats::from_sizes(self.compute_sizes().into_values())
    }
}

/// The components that are enriched and ranked, with their members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseComponents {
    sets: BTreeMap<ComponentId, Vec<VertexId>>,
}

impl BaseComponents {
    /// Creates base components from a map from identifiers to members.
    ///
    /// Member lists are sorted and deduplicated.
    ///
    /// # Panics
    ///
    /// This method will panic if a vertex belongs to more than one component.
    pub fn new(mut sets: BTreeMap<ComponentId, Vec<VertexId>>) -> Self {
        let mut seen = std::collections::HashMap::new();
        for (&c, members) in sets.iter_mut() {
            members.sort_unstable();
            members.dedup();
            for &v in members.iter() {
                if let Some(other) = seen.insert(v, c) {
                    panic!("Vertex {v} belongs to both component {other} and component {c}");
                }
            }
        }
        Self { sets }
    }

    pub fn num_components(&self) -> usize {
        self.sets.len()
    }

    /// Returns the identifiers of the components, in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.sets.keys().copied()
    }

    pub fn members(&self, c: ComponentId) -> Option<&[VertexId]> {
        self.sets.get(&c).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &[VertexId])> + '_ {
        self.sets.iter().map(|(&c, members)| (c, members.as_slice()))
    }

    /// Returns, for each of `num_nodes` vertices, its component, if any.
    pub fn assignment(&self, num_nodes: usize) -> Box<[Option<ComponentId>]> {
        let mut assignment = vec![None; num_nodes].into_boxed_slice();
        for (c, members) in self.iter() {
            for &v in members {
                assignment[v] = Some(c);
            }
        }
        assignment
    }

    pub fn stats(&self) -> ComponentStats {
        ComponentStats::from_sizes(self.sets.values().map(Vec::len))
    }
}
