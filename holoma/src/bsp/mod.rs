/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A bulk-synchronous, vertex-centric computation engine.
//!
//! A computation is described by a [`VertexProgram`] and executed in
//! _supersteps_. In each superstep every active vertex runs
//! [`compute`](VertexProgram::compute), which can modify the value of the
//! vertex and send messages to other vertices through its [`Context`]. The
//! messages sent during a superstep are delivered at the beginning of the next
//! one; messages addressed to the same vertex are merged by
//! [`combine`](VertexProgram::combine), so that each vertex receives at most
//! one message per superstep.
//!
//! # Activation
//!
//! All vertices are active in the first superstep. Afterwards, a vertex is
//! active if it voted [`Continue`](Vote::Continue) in the previous superstep,
//! or if it received a message. A vertex voting [`Halt`](Vote::Halt) sleeps
//! until a message wakes it up; sending messages does not keep the sender
//! active.
//!
//! # Termination
//!
//! The computation _converges_ when no vertex is active (which implies that no
//! message is pending). Otherwise, after each superstep the stopping
//! [predicate](preds) is evaluated, and the computation stops when it is true;
//! in this case, the messages of the last superstep are dropped and
//! [`converged`](Bsp::converged) returns false.
//!
//! # Parallelism
//!
//! Vertices are split in chunks of contiguous indices, whose size is set by
//! a [`Granularity`], and each chunk is processed by a Rayon task. Each task
//! accumulates its messages in a private outbox, combining them on the
//! sender side; outboxes are then merged pairwise, combining again on
//! collisions. For this reason `combine` must be associative and
//! commutative: the order in which messages are merged is not specified.
//!
//! # Errors
//!
//! An error returned by `compute`, or a message addressed to a vertex that
//! does not exist, aborts the computation with a [`BspError`]: the values are
//! consumed and no partial result is returned.
//!
//! # Examples
//!
//! Propagating the maximum index along a directed cycle:
//!
//! ```
//! use std::convert::Infallible;
//! use holoma::bsp::{Bsp, Context, VertexProgram, Vote, preds};
//! use holoma::graphs::attributed::{AttributedGraph, Edge};
//!
//! struct Max;
//!
//! impl VertexProgram for Max {
//!     type Value = usize;
//!     type Message = usize;
//!     type Error = Infallible;
//!
//!     fn compute(
//!         &self,
//!         ctx: &mut Context<'_, Self>,
//!         value: &mut usize,
//!         message: Option<usize>,
//!     ) -> Result<Vote, Infallible> {
//!         let changed = match message {
//!             Some(m) if m > *value => {
//!                 *value = m;
//!                 true
//!             }
//!             _ => ctx.superstep() == 0,
//!         };
//!         if changed {
//!             for arc in ctx.successors() {
//!                 ctx.send(arc.dst, *value);
//!             }
//!         }
//!         Ok(Vote::Halt)
//!     }
//!
//!     fn combine(&self, a: usize, b: usize) -> usize {
//!         a.max(b)
//!     }
//! }
//!
//! let g = AttributedGraph::new(4, (0..4).map(|v| Edge::equivalence(v, (v + 1) % 4)));
//! let mut bsp = Bsp::new(&g);
//! let values = bsp
//!     .run(&Max, (0..4).collect(), preds::MaxSupersteps::try_from(10).unwrap())
//!     .unwrap();
//! assert_eq!(&*values, &[3, 3, 3, 3]);
//! assert!(bsp.converged());
//! ```

pub mod preds;

use crate::graphs::attributed::{Arc, AttributedGraph, VertexId};
use crate::utils::Granularity;
use crossbeam_utils::CachePadded;
use dsi_progress_logger::{ConcurrentProgressLog, ProgressLog, no_logging};
use predicates::Predicate;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The vote of a vertex at the end of [`compute`](VertexProgram::compute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// The vertex will run in the next superstep even without messages.
    Continue,
    /// The vertex will not run again unless it receives a message.
    Halt,
}

/// A vertex-centric program.
///
/// Implementations must be [`Sync`], as `compute` is called concurrently on
/// different vertices.
pub trait VertexProgram: Sync {
    /// The value associated with each vertex.
    type Value: Send;
    /// The type of messages; messages addressed to the same vertex in the
    /// same superstep are merged by [`combine`](Self::combine).
    type Message: Send;
    /// The error returned by [`compute`](Self::compute). Programs that
    /// cannot fail should use [`Infallible`](std::convert::Infallible).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the program on a vertex.
    ///
    /// `message` is the combination of all messages sent to the vertex in the
    /// previous superstep, if any.
    fn compute(
        &self,
        ctx: &mut Context<'_, Self>,
        value: &mut Self::Value,
        message: Option<Self::Message>,
    ) -> Result<Vote, Self::Error>;

    /// Merges two messages addressed to the same vertex.
    ///
    /// This method must be associative and commutative.
    fn combine(&self, a: Self::Message, b: Self::Message) -> Self::Message;
}

/// Errors aborting a computation.
#[derive(thiserror::Error, Debug)]
pub enum BspError<E: std::error::Error + 'static> {
    #[error("Computation failed on vertex {vertex} at superstep {superstep}")]
    Compute {
        vertex: VertexId,
        superstep: usize,
        #[source]
        source: E,
    },
    #[error(
        "Vertex {vertex} sent a message to non-existent vertex {target} at superstep {superstep}"
    )]
    InvalidTarget {
        vertex: VertexId,
        target: VertexId,
        superstep: usize,
    },
    #[error("Expected {expected} initial values (one per vertex), got {got}")]
    ValueCount { expected: usize, got: usize },
}

/// Messages sent by a task, combined by target.
struct Outbox<M> {
    messages: HashMap<VertexId, M>,
    sent: u64,
}

impl<M> Outbox<M> {
    fn new() -> Self {
        Self {
            messages: HashMap::new(),
            sent: 0,
        }
    }

    fn push<P: VertexProgram<Message = M> + ?Sized>(
        &mut self,
        target: VertexId,
        message: M,
        program: &P,
    ) {
        let message = match self.messages.remove(&target) {
            Some(old) => program.combine(old, message),
            None => message,
        };
        self.messages.insert(target, message);
    }

    fn merge<P: VertexProgram<Message = M> + ?Sized>(mut self, mut other: Self, program: &P) -> Self {
        if self.messages.len() < other.messages.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.sent += other.sent;
        for (target, message) in other.messages {
            self.push(target, message, program);
        }
        self
    }
}

/// The view of the computation available to a vertex during
/// [`compute`](VertexProgram::compute).
pub struct Context<'a, P: VertexProgram + ?Sized> {
    graph: &'a AttributedGraph,
    program: &'a P,
    vertex: VertexId,
    superstep: usize,
    outbox: &'a mut Outbox<P::Message>,
    invalid_target: Option<VertexId>,
}

impl<'a, P: VertexProgram + ?Sized> Context<'a, P> {
    /// Returns the current superstep, starting from zero.
    #[inline(always)]
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Returns the vertex being computed.
    #[inline(always)]
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    /// Returns the outgoing arcs of the vertex being computed.
    #[inline(always)]
    pub fn successors(&self) -> &'a [Arc] {
        self.graph.successors(self.vertex)
    }

    /// Sends a message that will be delivered to `target` in the next
    /// superstep.
    ///
    /// Sending to a vertex that does not exist aborts the computation with
    /// [`BspError::InvalidTarget`] at the end of the current call to
    /// `compute`.
    pub fn send(&mut self, target: VertexId, message: P::Message) {
        if target >= self.graph.num_nodes() {
            self.invalid_target.get_or_insert(target);
            return;
        }
        self.outbox.sent += 1;
        self.outbox.push(target, message, self.program);
    }
}

/// Runs [vertex programs](VertexProgram) on an [`AttributedGraph`].
///
/// The engine is configured via setters and then executed via
/// [`run`](Self::run). After completion the number of supersteps and the
/// termination reason are available via [`supersteps`](Self::supersteps)
/// and [`converged`](Self::converged).
pub struct Bsp<'a> {
    graph: &'a AttributedGraph,
    granularity: Granularity,
    supersteps: usize,
    converged: bool,
}

impl std::fmt::Debug for Bsp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bsp")
            .field("granularity", &self.granularity)
            .field("supersteps", &self.supersteps)
            .field("converged", &self.converged)
            .finish_non_exhaustive()
    }
}

impl<'a> Bsp<'a> {
    pub fn new(graph: &'a AttributedGraph) -> Self {
        Self {
            graph,
            granularity: Granularity::default(),
            supersteps: 0,
            converged: false,
        }
    }

    /// Sets the parallel task granularity.
    ///
    /// The granularity expresses how many
    /// [vertices](Granularity::vertex_granularity) will be passed to a Rayon
    /// task at a time.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Returns the number of supersteps executed by the last run.
    pub fn supersteps(&self) -> usize {
        self.supersteps
    }

    /// Returns whether the last run stopped because no vertex was active,
    /// rather than because of the stopping predicate.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Runs a program until convergence or until the given predicate is
    /// satisfied, returning the final values.
    pub fn run<P: VertexProgram>(
        &mut self,
        program: &P,
        values: Vec<P::Value>,
        predicate: impl Predicate<preds::PredParams>,
    ) -> Result<Box<[P::Value]>, BspError<P::Error>> {
        self.run_with_logging(program, values, predicate, no_logging![], no_logging![])
    }

    /// Runs a program until convergence or until the given predicate is
    /// satisfied, logging progress.
    ///
    /// `pl` is a sequential [`ProgressLog`] counting supersteps. `cpl` is a
    /// [`ConcurrentProgressLog`] used for vertex-level progress inside each
    /// superstep. Their options will be preserved, making thus possible to
    /// customize the logs.
    pub fn run_with_logging<P: VertexProgram>(
        &mut self,
        program: &P,
        values: Vec<P::Value>,
        predicate: impl Predicate<preds::PredParams>,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<Box<[P::Value]>, BspError<P::Error>> {
        let n = self.graph.num_nodes();
        if values.len() != n {
            return Err(BspError::ValueCount {
                expected: n,
                got: values.len(),
            });
        }

        self.supersteps = 0;
        self.converged = false;

        let mut values = values.into_boxed_slice();
        if n == 0 {
            self.converged = true;
            return Ok(values);
        }

        let graph = self.graph;
        let mut inbox: Box<[Option<P::Message>]> = (0..n).map(|_| None).collect();
        let mut active = vec![true; n].into_boxed_slice();
        let chunk_size = self
            .granularity
            .vertex_granularity(n, graph.num_arcs());

        log::info!("Stopping criterion: {predicate}");
        log::debug!("Granularity: {chunk_size} vertices per task");

        pl.item_name("superstep");
        pl.expected_updates(None);
        pl.start("Running supersteps...");

        loop {
            let superstep = self.supersteps;
            let computed = CachePadded::new(AtomicUsize::new(0));

            cpl.item_name("vertex");
            cpl.expected_updates(Some(n));
            cpl.start(format!("Superstep {superstep}..."));

            let outbox = values
                .par_chunks_mut(chunk_size)
                .zip(inbox.par_chunks_mut(chunk_size))
                .zip(active.par_chunks_mut(chunk_size))
                .enumerate()
                .map_with(
                    cpl.clone(),
                    |cpl,
                     (chunk_index, ((values, inbox), active))|
                     -> Result<Outbox<P::Message>, BspError<P::Error>> {
                        let start = chunk_index * chunk_size;
                        let mut outbox = Outbox::new();
                        let mut local_computed = 0;
                        for (i, ((value, message), active)) in values
                            .iter_mut()
                            .zip(inbox.iter_mut())
                            .zip(active.iter_mut())
                            .enumerate()
                        {
                            let message = message.take();
                            if !*active && message.is_none() {
                                continue;
                            }
                            let vertex = start + i;
                            let mut ctx = Context {
                                graph,
                                program,
                                vertex,
                                superstep,
                                outbox: &mut outbox,
                                invalid_target: None,
                            };
                            let vote = program.compute(&mut ctx, value, message).map_err(
                                |source| BspError::Compute {
                                    vertex,
                                    superstep,
                                    source,
                                },
                            )?;
                            if let Some(target) = ctx.invalid_target {
                                return Err(BspError::InvalidTarget {
                                    vertex,
                                    target,
                                    superstep,
                                });
                            }
                            *active = vote == Vote::Continue;
                            local_computed += 1;
                        }
                        computed.fetch_add(local_computed, Ordering::Relaxed);
                        cpl.update_with_count(values.len());
                        Ok(outbox)
                    },
                )
                .try_reduce(|| Outbox::new(), |a, b| Ok(a.merge(b, program)))?;

            cpl.done();

            let messages = outbox.sent;
            for (target, message) in outbox.messages {
                inbox[target] = Some(message);
            }

            let next_active = active
                .iter()
                .zip(inbox.iter())
                .filter(|(active, message)| **active || message.is_some())
                .count();

            self.supersteps += 1;
            pl.update_and_display();

            log::info!(
                "Superstep {}: {} vertices computed, {} messages sent, {} vertices active",
                superstep,
                computed.load(Ordering::Relaxed),
                messages,
                next_active
            );

            if next_active == 0 {
                self.converged = true;
                break;
            }

            if predicate.eval(&preds::PredParams {
                superstep: self.supersteps,
                active: next_active,
                messages,
            }) {
                log::warn!(
                    "Stopped after {} supersteps with {} vertices still active",
                    self.supersteps,
                    next_active
                );
                break;
            }
        }

        pl.done();
        log::info!(
            "Completed {} supersteps ({})",
            self.supersteps,
            if self.converged {
                "converged"
            } else {
                "stopped"
            }
        );

        Ok(values)
    }
}
