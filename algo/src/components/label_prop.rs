/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::Components;
use anyhow::{Context as _, Result};
use dsi_progress_logger::{ProgressLog, no_logging};
use holoma::bsp::{Bsp, Context, VertexProgram, Vote, preds::MaxSupersteps};
use holoma::graphs::attributed::{AttributedGraph, EdgeKind, VertexId};
use holoma::utils::Granularity;
use std::convert::Infallible;

/// Minimum-label propagation along equivalence arcs.
///
/// The value of each vertex is its current label, initially its own index.
/// At superstep 0 each vertex sends its label to its equivalence successors
/// and halts; afterwards, a vertex adopts the minimum between its label and
/// the received one, and if its label changed it forwards it and votes to
/// continue. Hierarchy arcs are ignored, and no reciprocal arcs are
/// synthesized: on a non-symmetric relation labels flow only along the arcs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPropagation;

impl LabelPropagation {
    fn broadcast(ctx: &mut Context<'_, Self>, label: VertexId) {
        for arc in ctx.successors() {
            if arc.kind == EdgeKind::Equivalence {
                ctx.send(arc.dst, label);
            }
        }
    }
}

impl VertexProgram for LabelPropagation {
    type Value = VertexId;
    type Message = VertexId;
    type Error = Infallible;

    fn compute(
        &self,
        ctx: &mut Context<'_, Self>,
        label: &mut VertexId,
        message: Option<VertexId>,
    ) -> Result<Vote, Infallible> {
        match message {
            None if ctx.superstep() == 0 => {
                Self::broadcast(ctx, *label);
                Ok(Vote::Halt)
            }
            Some(received) if received < *label => {
                *label = received;
                Self::broadcast(ctx, received);
                Ok(Vote::Continue)
            }
            _ => Ok(Vote::Halt),
        }
    }

    fn combine(&self, a: VertexId, b: VertexId) -> VertexId {
        a.min(b)
    }
}

/// Computes the connected components of the equivalence arcs of a graph by
/// label propagation, running at most `max_iter` supersteps.
///
/// If the cap is reached before the labels reach a fixed point a warning is
/// logged and the current labels are returned.
///
/// # Errors
///
/// This function returns an error if `max_iter` is zero.
pub fn label_propagation(
    graph: &AttributedGraph,
    max_iter: usize,
    granularity: Granularity,
    pl: &mut impl ProgressLog,
) -> Result<Components> {
    let num_nodes = graph.num_nodes();
    let predicate = MaxSupersteps::try_from(max_iter)?;

    log::info!("Computing connected components of {num_nodes} vertices by label propagation");
    let mut bsp = Bsp::new(graph);
    bsp.granularity(granularity);
    let labels = bsp
        .run_with_logging(
            &LabelPropagation,
            (0..num_nodes).collect(),
            predicate,
            pl,
            no_logging![],
        )
        .context("Label propagation failed")?;

    if !bsp.converged() {
        log::warn!(
            "Labels did not reach a fixed point in {} supersteps: components may be split",
            bsp.supersteps()
        );
    }

    let components = Components::new(labels);
    log::info!("Number of components: {}", components.num_components());
    Ok(components)
}
