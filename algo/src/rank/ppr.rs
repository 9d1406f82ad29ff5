/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Batched personalized PageRank.
//!
//! For every enriched component *c* and every member *s* of *c* acting as
//! personalization source, we compute the personalized PageRank vector of
//! *s* restricted to *c*, that is, the stationary distribution of a random
//! walk that moves inside *c* following arc weights and restarts from *s*
//! with probability α (the _teleport probability_). All vectors are computed
//! at the same time in a single run of the [engine](holoma::bsp).
//!
//! # The formula
//!
//! Let *P* be the transition matrix of *c*: the probability of moving from
//! *v* to *u* is the sum of the weights of the arcs from *v* to *u* divided
//! by the [sum of the weights](super::norm::NormTable) of the arcs from *v*
//! to members of *c* (rows of dangling vertices are zero). The Jacobi
//! iteration
//!
//! > **r**⁽ᵗ⁾ = α **e**ₛ + (1 − α) *P*ᵀ **r**⁽ᵗ⁻¹⁾,    **r**⁽⁰⁾ = **e**ₛ
//!
//! converges to the personalized PageRank vector of *s*.
//!
//! # Propagating differences
//!
//! Vertices do not send their ranks, but their _variations_: at superstep
//! zero the initial mass, and afterwards the difference **r**⁽ᵗ⁾ − **r**⁽ᵗ⁻¹⁾.
//! Since the iteration is linear, the variation at superstep *t* + 1 is
//! (1 − α) *P*ᵀ applied to the variation at superstep *t*, except for the
//! restart term, which appears only in the first variation. Thus, a vertex
//! that receives no message has nothing to update, and it can halt: silence
//! means "no change".
//!
//! The computation is approximated in two ways: a vertex whose variation has
//! ℓ₁ norm at most ε does not propagate it, and single contributions whose
//! absolute value is at most the pruning threshold are not sent. With both
//! set to zero, superstep *t* holds exactly **r**⁽ᵗ⁾.
//!
//! # Component containment
//!
//! A vertex takes into account only contributions for components it belongs
//! to. Since contributions are sent only along arcs whose endpoints share the
//! component, no contribution should ever be discarded; nonetheless,
//! discarded entries are counted and the count is logged at debug level.
//!
//! # Memory
//!
//! Each vertex stores an entry for each source of each of its components, so
//! memory usage is proportional to the sum of the squares of the sizes of
//! the enriched components. Filter base components by size before enriching
//! them.

use super::norm::NormTable;
use super::table::RankTable;
use crate::enrichment::Membership;
use crate::eval;
use anyhow::{Context as _, Result, ensure};
use dsi_progress_logger::{ConcurrentProgressLog, ProgressLog, no_logging};
use holoma::bsp::{Bsp, Context, VertexProgram, Vote, preds::PredParams};
use holoma::graphs::attributed::{AttributedGraph, ComponentId, VertexId};
use holoma::utils::Granularity;
use kahan::KahanSum;
use predicates::Predicate;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The vertices acting as personalization sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sources {
    /// Every vertex is a source in each of its enriched components.
    #[default]
    All,
    /// Only the given vertex is a source, in each of its enriched components.
    Single(VertexId),
}

impl Sources {
    #[inline(always)]
    pub fn contains(&self, v: VertexId) -> bool {
        match self {
            Sources::All => true,
            Sources::Single(s) => *s == v,
        }
    }
}

impl std::fmt::Display for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sources::All => f.write_str("all vertices"),
            Sources::Single(s) => write!(f, "vertex {s}"),
        }
    }
}

/// The vertex program of the batched computation.
struct Propagation<'a> {
    membership: &'a Membership,
    norm: &'a NormTable,
    teleport_prob: f64,
    epsilon: f64,
    prune_threshold: f64,
    sources: Sources,
    dropped: AtomicUsize,
}

impl Propagation<'_> {
    /// Sends to each successor its share of the variation of each shared
    /// component.
    fn propagate(&self, ctx: &mut Context<'_, Self>, delta: &RankTable) {
        let v = ctx.vertex();
        for arc in ctx.successors() {
            let mut message = RankTable::new();
            for c in self.membership.common(v, arc.dst) {
                let sum = self.norm.get(v, c);
                let Some(sources) = delta.component(c) else {
                    continue;
                };
                if sum <= 0.0 {
                    continue;
                }
                let w = arc.weight / sum;
                for (&s, &d) in sources {
                    let x = d * w;
                    if x.abs() > self.prune_threshold {
                        message.add(c, s, x);
                    }
                }
            }
            if !message.is_empty() {
                ctx.send(arc.dst, message);
            }
        }
    }
}

impl VertexProgram for Propagation<'_> {
    type Value = RankTable;
    type Message = RankTable;
    type Error = Infallible;

    fn compute(
        &self,
        ctx: &mut Context<'_, Self>,
        ranks: &mut RankTable,
        message: Option<RankTable>,
    ) -> Result<Vote, Infallible> {
        let v = ctx.vertex();

        if ctx.superstep() == 0 {
            if ranks.is_empty() {
                return Ok(Vote::Halt);
            }
            self.propagate(ctx, ranks);
            // Sources must run at superstep one to restart
            return Ok(Vote::Continue);
        }

        let mut delta = message.unwrap_or_default();
        let dropped = delta.retain_components(|c| self.membership.contains(v, c));
        if dropped != 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        delta.scale(1.0 - self.teleport_prob);
        if ctx.superstep() == 1 && self.sources.contains(v) {
            for &c in self.membership.components_of(v) {
                delta.add(c, v, self.teleport_prob - 1.0);
            }
        }
        ranks.merge(&delta);

        if delta.l1_norm() > self.epsilon {
            self.propagate(ctx, &delta);
            Ok(Vote::Continue)
        } else {
            Ok(Vote::Halt)
        }
    }

    fn combine(&self, mut a: RankTable, b: RankTable) -> RankTable {
        if a.len() < b.len() {
            let mut b = b;
            b.merge(&a);
            return b;
        }
        a.merge(&b);
        a
    }
}

/// Computes personalized PageRank vectors for all (or one) sources of all
/// enriched components.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run), which returns a [`PprResult`].
///
/// # Examples
///
/// ```
/// # fn main() -> anyhow::Result<()> {
/// use holoma::bsp::preds::MaxSupersteps;
/// use holoma::graphs::attributed::{AttributedGraph, Edge};
/// use holoma_algo::enrichment::Membership;
/// use holoma_algo::rank::{norm::normalize, ppr::PersonalizedPageRank};
///
/// let graph = AttributedGraph::new(2, [Edge::equivalence(0, 1), Edge::equivalence(1, 0)]);
/// let membership = Membership::new([vec![0], vec![0]]);
/// let norm = normalize(&graph, &membership);
///
/// let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
/// ppr.teleport_prob(0.5).epsilon(0.0).prune_threshold(0.0);
/// let result = ppr.run(MaxSupersteps::try_from(100)?)?;
///
/// assert!((result.get(0, 0, 0) - 2.0 / 3.0).abs() < 1E-9);
/// assert!((result.get(0, 0, 1) - 1.0 / 3.0).abs() < 1E-9);
/// #     Ok(())
/// # }
/// ```
pub struct PersonalizedPageRank<'a> {
    graph: &'a AttributedGraph,
    membership: &'a Membership,
    norm: &'a NormTable,
    teleport_prob: f64,
    epsilon: f64,
    prune_threshold: f64,
    sources: Sources,
    granularity: Granularity,

    supersteps: usize,
    converged: bool,
    dropped: usize,
}

impl std::fmt::Debug for PersonalizedPageRank<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalizedPageRank")
            .field("teleport_prob", &self.teleport_prob)
            .field("epsilon", &self.epsilon)
            .field("prune_threshold", &self.prune_threshold)
            .field("sources", &self.sources)
            .field("granularity", &self.granularity)
            .field("supersteps", &self.supersteps)
            .field("converged", &self.converged)
            .finish_non_exhaustive()
    }
}

impl<'a> PersonalizedPageRank<'a> {
    pub const DEFAULT_TELEPORT_PROB: f64 = 0.5;
    pub const DEFAULT_EPSILON: f64 = 0.001;
    pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.005;

    /// Creates a new computation.
    ///
    /// `norm` must have been [computed](super::norm::normalize) from `graph`
    /// and `membership`.
    pub fn new(graph: &'a AttributedGraph, membership: &'a Membership, norm: &'a NormTable) -> Self {
        Self {
            graph,
            membership,
            norm,
            teleport_prob: Self::DEFAULT_TELEPORT_PROB,
            epsilon: Self::DEFAULT_EPSILON,
            prune_threshold: Self::DEFAULT_PRUNE_THRESHOLD,
            sources: Sources::default(),
            granularity: Granularity::default(),
            supersteps: 0,
            converged: false,
            dropped: 0,
        }
    }

    /// Sets the teleport (restart) probability α.
    ///
    /// # Panics
    ///
    /// Panics if `teleport_prob` is not in the interval (0 . . 1).
    pub fn teleport_prob(&mut self, teleport_prob: f64) -> &mut Self {
        assert!(
            teleport_prob > 0.0 && teleport_prob < 1.0,
            "The teleport probability must be in (0 . . 1), got {teleport_prob}"
        );
        self.teleport_prob = teleport_prob;
        self
    }

    /// Sets the threshold on the ℓ₁ norm of the variation of a vertex below
    /// which the variation is not propagated.
    ///
    /// # Panics
    ///
    /// Panics if `epsilon` is negative or NaN.
    pub fn epsilon(&mut self, epsilon: f64) -> &mut Self {
        assert!(
            epsilon >= 0.0,
            "The convergence threshold must be nonnegative, got {epsilon}"
        );
        self.epsilon = epsilon;
        self
    }

    /// Sets the threshold on the absolute value of single contributions below
    /// which contributions are not sent.
    ///
    /// # Panics
    ///
    /// Panics if `prune_threshold` is negative or NaN.
    pub fn prune_threshold(&mut self, prune_threshold: f64) -> &mut Self {
        assert!(
            prune_threshold >= 0.0,
            "The pruning threshold must be nonnegative, got {prune_threshold}"
        );
        self.prune_threshold = prune_threshold;
        self
    }

    /// Sets the personalization sources.
    ///
    /// # Panics
    ///
    /// Panics if a single source is not a vertex of the graph.
    pub fn sources(&mut self, sources: Sources) -> &mut Self {
        if let Sources::Single(s) = sources {
            assert!(
                s < self.graph.num_nodes(),
                "Source {s} does not exist (the graph has {} vertices)",
                self.graph.num_nodes()
            );
        }
        self.sources = sources;
        self
    }

    /// Sets the parallel task granularity.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Returns the number of supersteps performed by the last call to
    /// [`run`](Self::run).
    pub fn supersteps(&self) -> usize {
        self.supersteps
    }

    /// Returns whether the last run stopped because no variation was left to
    /// propagate, rather than because of the stopping predicate.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Returns the number of contributions discarded by the last run because
    /// their receiver did not belong to their component.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Runs the computation until no variation is left to propagate or the
    /// given predicate is satisfied.
    pub fn run(&mut self, predicate: impl Predicate<PredParams>) -> Result<PprResult> {
        self.run_with_logging(predicate, no_logging![], no_logging![])
    }

    /// Runs the computation, logging progress.
    ///
    /// `pl` is a sequential [`ProgressLog`] counting supersteps. `cpl` is a
    /// [`ConcurrentProgressLog`] used for vertex-level progress inside each
    /// superstep.
    pub fn run_with_logging(
        &mut self,
        predicate: impl Predicate<PredParams>,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<PprResult> {
        let n = self.graph.num_nodes();
        ensure!(
            self.membership.num_nodes() == n,
            "The membership has {} vertices, but the graph has {n}",
            self.membership.num_nodes()
        );
        ensure!(
            self.norm.num_nodes() == n,
            "The normalization table has {} vertices, but the graph has {n}",
            self.norm.num_nodes()
        );

        log::info!("Teleport probability: {}", self.teleport_prob);
        log::info!("Epsilon: {}", self.epsilon);
        log::info!("Pruning threshold: {}", self.prune_threshold);
        log::info!("Sources: {}", self.sources);

        let initial = (0..n)
            .map(|v| {
                if self.sources.contains(v) {
                    self.membership
                        .components_of(v)
                        .iter()
                        .map(|&c| (c, v, 1.0))
                        .collect::<RankTable>()
                } else {
                    RankTable::new()
                }
            })
            .collect::<Vec<_>>();

        let program = Propagation {
            membership: self.membership,
            norm: self.norm,
            teleport_prob: self.teleport_prob,
            epsilon: self.epsilon,
            prune_threshold: self.prune_threshold,
            sources: self.sources,
            dropped: AtomicUsize::new(0),
        };

        let mut bsp = Bsp::new(self.graph);
        bsp.granularity(self.granularity);
        let ranks = bsp
            .run_with_logging(&program, initial, predicate, pl, cpl)
            .context("Personalized PageRank failed")?;

        self.supersteps = bsp.supersteps();
        self.converged = bsp.converged();
        self.dropped = program.dropped.into_inner();
        if self.dropped != 0 {
            log::debug!(
                "Discarded {} contributions for components not claimed by their receiver",
                self.dropped
            );
        }

        let mut vectors = BTreeMap::<ComponentId, BTreeMap<VertexId, BTreeMap<VertexId, f64>>>::new();
        for (target, table) in ranks.iter().enumerate() {
            for (c, s, rank) in table.iter() {
                vectors
                    .entry(c)
                    .or_default()
                    .entry(s)
                    .or_default()
                    .insert(target, rank);
            }
        }
        let result = PprResult { vectors };
        log::info!(
            "Computed {} rank vectors with {} entries in {} supersteps",
            result.num_vectors(),
            result.num_entries(),
            self.supersteps
        );
        Ok(result)
    }
}

/// The result of a [`PersonalizedPageRank`] computation: for each component,
/// for each source, the rank of each target.
///
/// Ranks of targets that were never reached are zero and are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PprResult {
    vectors: BTreeMap<ComponentId, BTreeMap<VertexId, BTreeMap<VertexId, f64>>>,
}

impl PprResult {
    /// Returns the rank of `target` in the vector of `source` in component
    /// `c`, or zero.
    pub fn get(&self, c: ComponentId, source: VertexId, target: VertexId) -> f64 {
        self.vector(c, source)
            .and_then(|vector| vector.get(&target))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns the vector of `source` in component `c`.
    pub fn vector(&self, c: ComponentId, source: VertexId) -> Option<&BTreeMap<VertexId, f64>> {
        self.vectors.get(&c).and_then(|sources| sources.get(&source))
    }

    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.vectors.keys().copied()
    }

    /// Returns the sources having a vector in component `c`.
    pub fn sources(&self, c: ComponentId) -> impl Iterator<Item = VertexId> + '_ {
        self.vectors
            .get(&c)
            .into_iter()
            .flat_map(|sources| sources.keys().copied())
    }

    /// Returns an iterator over `(component, source, target, rank)` tuples.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, VertexId, VertexId, f64)> + '_ {
        self.vectors.iter().flat_map(|(&c, sources)| {
            sources.iter().flat_map(move |(&s, vector)| {
                vector.iter().map(move |(&t, &rank)| (c, s, t, rank))
            })
        })
    }

    /// Returns the sum of the ranks in the vector of `source` in component
    /// `c`.
    pub fn mass(&self, c: ComponentId, source: VertexId) -> f64 {
        self.vector(c, source).map_or(0.0, |vector| {
            vector
                .values()
                .fold(KahanSum::new(), |sum, &rank| sum + rank)
                .sum()
        })
    }

    /// Returns the [statistical mean](eval::statistical_mean) of each vector
    /// of component `c`, indexed by source.
    pub fn statistical_means(&self, c: ComponentId) -> BTreeMap<VertexId, f64> {
        self.vectors
            .get(&c)
            .into_iter()
            .flat_map(|sources| sources.iter())
            .map(|(&s, vector)| (s, eval::statistical_mean(vector)))
            .collect()
    }

    pub fn num_vectors(&self) -> usize {
        self.vectors.values().map(BTreeMap::len).sum()
    }

    pub fn num_entries(&self) -> usize {
        self.vectors
            .values()
            .flat_map(|sources| sources.values())
            .map(BTreeMap::len)
            .sum()
    }
}
