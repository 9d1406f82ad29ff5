/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]
#![allow(clippy::type_complexity)]

pub mod components;
pub mod config;
pub mod enrichment;
pub mod eval;
pub mod pipeline;
pub mod rank;

pub mod prelude {
    pub use crate::components::{BaseComponents, ComponentStats, Components, label_propagation};
    pub use crate::config::{Config, ConfigError};
    pub use crate::enrichment::{Membership, enrich};
    pub use crate::eval::{best_friends, statistical_mean, worst_friends};
    pub use crate::pipeline::{Pipeline, PipelineOutput};
    pub use crate::rank::norm::{NormTable, normalize};
    pub use crate::rank::ppr::{PersonalizedPageRank, PprResult, Sources};
    pub use crate::rank::table::RankTable;
}
