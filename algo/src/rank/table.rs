/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Sparse two-level tables of ranks.

use holoma::graphs::attributed::{ComponentId, VertexId};
use std::collections::BTreeMap;

/// A sparse map from (component, source) pairs to values; absent entries
/// are zero.
///
/// During a PageRank computation each vertex stores a table with its rank in
/// each component for each source, and messages are tables of rank
/// variations.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankTable {
    ranks: BTreeMap<ComponentId, BTreeMap<VertexId, f64>>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for component `c` and source `s`, or zero.
    pub fn get(&self, c: ComponentId, s: VertexId) -> f64 {
        self.ranks
            .get(&c)
            .and_then(|sources| sources.get(&s))
            .copied()
            .unwrap_or(0.0)
    }

    /// Adds `x` to the value for component `c` and source `s`.
    pub fn add(&mut self, c: ComponentId, s: VertexId, x: f64) {
        *self.ranks.entry(c).or_default().entry(s).or_insert(0.0) += x;
    }

    /// Returns the values of component `c`, if any.
    pub fn component(&self, c: ComponentId) -> Option<&BTreeMap<VertexId, f64>> {
        self.ranks.get(&c)
    }

    /// Returns the components having at least one entry.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.ranks.keys().copied()
    }

    /// Returns an iterator over `(component, source, value)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, VertexId, f64)> + '_ {
        self.ranks
            .iter()
            .flat_map(|(&c, sources)| sources.iter().map(move |(&s, &x)| (c, s, x)))
    }

    /// Adds all entries of `other` to this table.
    pub fn merge(&mut self, other: &RankTable) {
        for (c, s, x) in other.iter() {
            self.add(c, s, x);
        }
    }

    /// Multiplies all entries by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.ranks
            .values_mut()
            .flat_map(|sources| sources.values_mut())
            .for_each(|x| *x *= factor);
    }

    /// Keeps only the components for which `keep` is true, returning the
    /// number of discarded entries.
    pub fn retain_components(&mut self, mut keep: impl FnMut(ComponentId) -> bool) -> usize {
        let mut dropped = 0;
        self.ranks.retain(|&c, sources| {
            let kept = keep(c);
            if !kept {
                dropped += sources.len();
            }
            kept
        });
        dropped
    }

    /// Returns the sum of the absolute values of the entries.
    pub fn l1_norm(&self) -> f64 {
        self.iter().map(|(_, _, x)| x.abs()).sum()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.ranks.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl FromIterator<(ComponentId, VertexId, f64)> for RankTable {
    fn from_iter<I: IntoIterator<Item = (ComponentId, VertexId, f64)>>(iter: I) -> Self {
        let mut table = RankTable::new();
        for (c, s, x) in iter {
            table.add(c, s, x);
        }
        table
    }
}
