/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Enrichment of components with their neighborhoods.
//!
//! Starting from the [base components](crate::components::BaseComponents),
//! component identifiers are flooded along all arcs, of both kinds, for at
//! most `depth` hops. At the end, each vertex knows the set of components it
//! belongs to: its base component, if any, and every component having a
//! member at distance at most `depth`. A vertex can thus belong to several
//! enriched components, and the enriched components of a vertex are the
//! scope of its [personalized PageRank](crate::rank::ppr) contributions.

use crate::components::{BaseComponents, ComponentStats};
use anyhow::{Context as _, Result, ensure};
use dsi_progress_logger::{ProgressLog, no_logging};
use holoma::bsp::{Bsp, Context, VertexProgram, Vote, preds::MaxSupersteps};
use holoma::graphs::attributed::{AttributedGraph, ComponentId, VertexId};
use holoma::utils::Granularity;
use itertools::{EitherOrBoth, Itertools};
use std::collections::BTreeMap;
use std::convert::Infallible;

/// The enriched components of each vertex.
///
/// The components of each vertex are stored as a sorted slice, so that
/// membership tests are binary searches and [common
/// components](Membership::common) are computed by merging.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Membership {
    sets: Box<[Box<[ComponentId]>]>,
}

impl Membership {
    /// Creates a membership structure from the components of each vertex.
    ///
    /// Each set is sorted and deduplicated.
    pub fn new(sets: impl IntoIterator<Item = Vec<ComponentId>>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .map(|mut set| {
                    set.sort_unstable();
                    set.dedup();
                    set.into_boxed_slice()
                })
                .collect(),
        }
    }

    /// Returns the membership of base members only, that is, enrichment at
    /// depth zero.
    pub fn from_base(base: &BaseComponents, num_nodes: usize) -> Self {
        Self::new(
            base.assignment(num_nodes)
                .iter()
                .map(|c| c.iter().copied().collect::<Vec<_>>()),
        )
    }

    pub fn num_nodes(&self) -> usize {
        self.sets.len()
    }

    /// Returns the sorted components of `v`.
    #[inline(always)]
    pub fn components_of(&self, v: VertexId) -> &[ComponentId] {
        &self.sets[v]
    }

    #[inline(always)]
    pub fn contains(&self, v: VertexId, c: ComponentId) -> bool {
        self.sets[v].binary_search(&c).is_ok()
    }

    /// Returns the components shared by `u` and `v`, in increasing order.
    pub fn common(&self, u: VertexId, v: VertexId) -> impl Iterator<Item = ComponentId> + '_ {
        self.sets[u]
            .iter()
            .merge_join_by(self.sets[v].iter(), |a, b| a.cmp(b))
            .filter_map(|pair| match pair {
                EitherOrBoth::Both(&c, _) => Some(c),
                _ => None,
            })
    }

    /// Returns the members of the enriched component `c`, in increasing
    /// order.
    pub fn members(&self, c: ComponentId) -> Vec<VertexId> {
        (0..self.num_nodes())
            .filter(|&v| self.contains(v, c))
            .collect()
    }

    /// Returns the total number of (vertex, component) pairs.
    pub fn num_memberships(&self) -> usize {
        self.sets.iter().map(|set| set.len()).sum()
    }

    /// Returns the number of members of each enriched component.
    pub fn component_sizes(&self) -> BTreeMap<ComponentId, usize> {
        let mut sizes = BTreeMap::new();
        for &c in self.sets.iter().flat_map(|set| set.iter()) {
            *sizes.entry(c).or_insert(0) += 1;
        }
        sizes
    }

    pub fn stats(&self) -> ComponentStats {
        ComponentStats::from_sizes(self.component_sizes().into_values())
    }

    /// Returns a new membership structure without the enriched components
    /// whose number of members is outside `[min, max]`.
    pub fn filter_by_size(&self, min: usize, max: usize) -> Self {
        let sizes = self.component_sizes();
        let keep = |c: &ComponentId| (min..=max).contains(&sizes[c]);
        log::info!(
            "Kept {} enriched components of size in [{min} . . {max}] out of {}",
            sizes.keys().filter(|c| keep(c)).count(),
            sizes.len()
        );
        Self {
            sets: self
                .sets
                .iter()
                .map(|set| set.iter().copied().filter(keep).collect())
                .collect(),
        }
    }
}

/// Flooding of component identifiers.
///
/// Only newly gained identifiers are forwarded, and only in supersteps
/// smaller than `depth`, so identifiers travel at most `depth` hops. The
/// combiner is set union.
#[derive(Debug, Clone, Copy)]
pub struct Enrichment {
    depth: usize,
}

impl Enrichment {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl VertexProgram for Enrichment {
    type Value = Vec<ComponentId>;
    type Message = Vec<ComponentId>;
    type Error = Infallible;

    fn compute(
        &self,
        ctx: &mut Context<'_, Self>,
        set: &mut Vec<ComponentId>,
        message: Option<Vec<ComponentId>>,
    ) -> Result<Vote, Infallible> {
        let gained = match message {
            None if ctx.superstep() == 0 => set.clone(),
            None => vec![],
            Some(received) => {
                let gained = received
                    .iter()
                    .copied()
                    .filter(|c| set.binary_search(c).is_err())
                    .collect::<Vec<_>>();
                if !gained.is_empty() {
                    *set = set.iter().copied().merge(gained.iter().copied()).collect();
                }
                gained
            }
        };

        if !gained.is_empty() && ctx.superstep() < self.depth {
            for arc in ctx.successors() {
                ctx.send(arc.dst, gained.clone());
            }
        }
        // Sets grow only on incoming messages
        Ok(Vote::Halt)
    }

    fn combine(&self, a: Vec<ComponentId>, b: Vec<ComponentId>) -> Vec<ComponentId> {
        a.into_iter().merge(b).dedup().collect()
    }
}

/// Enriches the base components with the vertices at most `depth` hops away
/// along arcs of any kind.
///
/// With `depth` equal to zero no superstep is run and only base members
/// belong to components. An error is returned if a base component names a
/// vertex that is not in the graph.
pub fn enrich(
    graph: &AttributedGraph,
    base: &BaseComponents,
    depth: usize,
    granularity: Granularity,
    pl: &mut impl ProgressLog,
) -> Result<Membership> {
    let num_nodes = graph.num_nodes();
    for (c, members) in base.iter() {
        if let Some(&v) = members.iter().max() {
            ensure!(
                v < num_nodes,
                "Component {c} contains vertex {v}, but the graph has {num_nodes} vertices"
            );
        }
    }
    let initial = Membership::from_base(base, num_nodes);
    if depth == 0 {
        log::info!("Enrichment depth is zero: keeping base components");
        return Ok(initial);
    }

    log::info!(
        "Enriching {} components up to depth {depth}",
        base.num_components()
    );
    let mut bsp = Bsp::new(graph);
    bsp.granularity(granularity);
    let sets = bsp
        .run_with_logging(
            &Enrichment::new(depth),
            initial.sets.iter().map(|set| set.to_vec()).collect(),
            MaxSupersteps::try_from(depth.saturating_add(1))?,
            pl,
            no_logging![],
        )
        .context("Enrichment failed")?;

    let membership = Membership::new(sets.into_vec());
    log::info!(
        "{} memberships after enrichment ({} before)",
        membership.num_memberships(),
        initial.num_memberships()
    );
    Ok(membership)
}
