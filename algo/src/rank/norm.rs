/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Per-component normalization of outgoing arc weights.

use crate::enrichment::Membership;
use holoma::graphs::attributed::{AttributedGraph, ComponentId, VertexId};
use holoma::utils::RAYON_MIN_LEN;
use kahan::KahanSum;
use rayon::prelude::*;

/// For each vertex `v` and each enriched component `c` of `v`, the sum of
/// the weights of the arcs from `v` to the other members of `c`.
///
/// Parallel arcs and self-loops contribute with their full weight. A zero
/// entry marks `(v, c)` as _dangling_: `v` has no arc inside `c`, and thus
/// will never propagate rank for `c`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormTable {
    entries: Box<[Box<[(ComponentId, f64)]>]>,
}

impl NormTable {
    pub fn num_nodes(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entries of `v`, sorted by component.
    pub fn entries_of(&self, v: VertexId) -> &[(ComponentId, f64)] {
        &self.entries[v]
    }

    /// Returns the sum of the weights of the arcs from `v` inside `c`, or
    /// zero if `v` does not belong to `c`.
    #[inline]
    pub fn get(&self, v: VertexId, c: ComponentId) -> f64 {
        let entries = &self.entries[v];
        entries
            .binary_search_by_key(&c, |&(c, _)| c)
            .map_or(0.0, |i| entries[i].1)
    }

    /// Returns whether `v` belongs to `c` but has no arc inside `c`.
    pub fn is_dangling(&self, v: VertexId, c: ComponentId) -> bool {
        let entries = &self.entries[v];
        entries
            .binary_search_by_key(&c, |&(c, _)| c)
            .is_ok_and(|i| entries[i].1 == 0.0)
    }

    /// Returns an iterator over the dangling (vertex, component) pairs.
    pub fn dangling(&self) -> impl Iterator<Item = (VertexId, ComponentId)> + '_ {
        self.entries.iter().enumerate().flat_map(|(v, entries)| {
            entries
                .iter()
                .filter(|&&(_, sum)| sum == 0.0)
                .map(move |&(c, _)| (v, c))
        })
    }

    pub fn num_entries(&self) -> usize {
        self.entries.iter().map(|entries| entries.len()).sum()
    }
}

/// Computes the [`NormTable`] of a graph for the given membership.
///
/// # Panics
///
/// This function will panic if the membership does not have the same number
/// of vertices as the graph.
pub fn normalize(graph: &AttributedGraph, membership: &Membership) -> NormTable {
    assert_eq!(
        graph.num_nodes(),
        membership.num_nodes(),
        "The membership has {} vertices, but the graph has {}",
        membership.num_nodes(),
        graph.num_nodes()
    );

    let entries = (0..graph.num_nodes())
        .into_par_iter()
        .with_min_len(RAYON_MIN_LEN)
        .map(|v| {
            let components = membership.components_of(v);
            let mut sums = components
                .iter()
                .map(|_| KahanSum::<f64>::new())
                .collect::<Vec<_>>();
            for arc in graph.successors(v) {
                for (sum, &c) in sums.iter_mut().zip(components) {
                    if membership.contains(arc.dst, c) {
                        *sum += arc.weight;
                    }
                }
            }
            components
                .iter()
                .zip(sums)
                .map(|(&c, sum)| (c, sum.sum()))
                .collect::<Box<[_]>>()
        })
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let norm = NormTable { entries };
    log::info!(
        "Normalization: {} entries, {} dangling",
        norm.num_entries(),
        norm.dangling().count()
    );
    norm
}
