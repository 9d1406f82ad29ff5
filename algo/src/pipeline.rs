/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The complete matching computation, from the graph to the rank vectors.
//!
//! The phases are run in order, each consuming the output of the previous
//! one:
//!
//! 1. [label propagation](crate::components::label_propagation) over
//!    equivalence arcs;
//! 2. [size filtering](crate::components::Components::filter_by_size) of
//!    the components;
//! 3. [enrichment](crate::enrichment::enrich) of the surviving components,
//!    optionally followed by a [size
//!    filter](crate::enrichment::Membership::filter_by_size) on the enriched
//!    components;
//! 4. [normalization](crate::rank::norm::normalize) of arc weights;
//! 5. batched [personalized PageRank](crate::rank::ppr).

use crate::components::{BaseComponents, Components, label_propagation};
use crate::config::Config;
use crate::enrichment::{Membership, enrich};
use crate::rank::norm::{NormTable, normalize};
use crate::rank::ppr::{PersonalizedPageRank, PprResult};
use anyhow::{Context, Result};
use dsi_progress_logger::{ConcurrentProgressLog, ProgressLog, no_logging};
use holoma::bsp::preds::MaxSupersteps;
use holoma::graphs::attributed::AttributedGraph;

/// The outputs of all phases of a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub components: Components,
    pub base: BaseComponents,
    pub membership: Membership,
    pub norm: NormTable,
    pub ranks: PprResult,
}

/// Runs all phases on a graph with a given [configuration](Config).
#[derive(Debug)]
pub struct Pipeline<'a> {
    graph: &'a AttributedGraph,
    config: Config,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline, validating the configuration.
    pub fn new(graph: &'a AttributedGraph, config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { graph, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineOutput> {
        self.run_with_logging(no_logging![], no_logging![])
    }

    /// Runs all phases, logging progress.
    ///
    /// `pl` counts the supersteps of each phase, and `cpl` is used for
    /// vertex-level progress during personalized PageRank.
    pub fn run_with_logging(
        &self,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<PipelineOutput> {
        let config = &self.config;
        let graph = self.graph;
        log::info!(
            "Running on a graph with {} vertices and {} arcs",
            graph.num_nodes(),
            graph.num_arcs()
        );

        log::info!("[1/5] Connected components");
        let components = label_propagation(graph, config.max_iter, config.granularity, pl)
            .context("Could not compute connected components")?;
        log::info!("Connected components:\n{}", components.stats());

        log::info!("[2/5] Size filtering");
        let base = components.filter_by_size(
            config.min_cc_size,
            config.max_cc_size,
            config.drop_singletons,
        );
        log::info!("Base components:\n{}", base.stats());

        log::info!("[3/5] Enrichment");
        let mut membership = enrich(graph, &base, config.depth, config.granularity, pl)
            .context("Could not enrich components")?;
        if config.min_enriched_size > 0 || config.max_enriched_size < usize::MAX {
            membership =
                membership.filter_by_size(config.min_enriched_size, config.max_enriched_size);
        }
        log::info!("Enriched components:\n{}", membership.stats());

        log::info!("[4/5] Normalization");
        let norm = normalize(graph, &membership);

        log::info!("[5/5] Personalized PageRank");
        let predicate = MaxSupersteps::try_from(config.max_iter_ppr)?;
        let mut ppr = PersonalizedPageRank::new(graph, &membership, &norm);
        ppr.teleport_prob(config.teleport_prob)
            .epsilon(config.epsilon)
            .prune_threshold(config.prune_threshold)
            .granularity(config.granularity);
        let ranks = ppr
            .run_with_logging(predicate, pl, cpl)
            .context("Could not compute personalized PageRank")?;

        Ok(PipelineOutput {
            components,
            base,
            membership,
            norm,
            ranks,
        })
    }
}
