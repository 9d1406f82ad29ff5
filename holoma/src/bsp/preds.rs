/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Predicates implementing stopping conditions.
//!
//! The [engine](super::Bsp) stops by itself when no vertex is active and no
//! message is pending; otherwise, it evaluates a [predicate](Predicate) after
//! each superstep and stops when it is true. This module provides a few such
//! predicates.
//!
//! You can combine the predicates using the `and` and `or` methods provided
//! by the [`Predicate`] trait.
//!
//! # Examples
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use predicates::prelude::*;
//! use holoma::bsp::preds::{MaxMessages, MaxSupersteps};
//!
//! let mut predicate = MaxSupersteps::try_from(30)?.boxed();
//! predicate = predicate.or(MaxMessages::from(1_000_000)).boxed();
//! #     Ok(())
//! # }
//! ```

use anyhow::ensure;
use predicates::{Predicate, reflection::PredicateReflection};
use std::fmt::Display;

#[doc(hidden)]
/// This structure is passed to stopping predicates to provide the
/// information that is needed to evaluate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredParams {
    /// The number of supersteps executed so far.
    pub superstep: usize,
    /// The number of vertices that would run in the next superstep.
    pub active: usize,
    /// The number of messages sent in the last superstep, before combining.
    pub messages: u64,
}

/// Stops after at most the provided number of supersteps.
///
/// Every algorithm of this workspace passes one of these as a hard cap.
#[derive(Debug, Clone)]
pub struct MaxSupersteps {
    max_supersteps: usize,
}

impl MaxSupersteps {
    pub const DEFAULT_MAX_SUPERSTEPS: usize = usize::MAX;
}

impl TryFrom<usize> for MaxSupersteps {
    type Error = anyhow::Error;
    fn try_from(max_supersteps: usize) -> anyhow::Result<Self> {
        ensure!(
            max_supersteps > 0,
            "The maximum number of supersteps must be positive"
        );
        Ok(MaxSupersteps { max_supersteps })
    }
}

impl Default for MaxSupersteps {
    fn default() -> Self {
        Self::try_from(Self::DEFAULT_MAX_SUPERSTEPS).unwrap()
    }
}

impl Display for MaxSupersteps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max supersteps: {})", self.max_supersteps))
    }
}

impl PredicateReflection for MaxSupersteps {}

impl Predicate<PredParams> for MaxSupersteps {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.superstep >= self.max_supersteps
    }
}

/// Stops when a superstep sends at most the given number of messages.
///
/// Useful to cut the tail of a computation in which only a handful of
/// vertices are still exchanging updates.
#[derive(Debug, Clone)]
pub struct MinMessages {
    min_messages: u64,
}

impl From<u64> for MinMessages {
    fn from(min_messages: u64) -> Self {
        MinMessages { min_messages }
    }
}

impl Display for MinMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(min messages: {})", self.min_messages))
    }
}

impl PredicateReflection for MinMessages {}

impl Predicate<PredParams> for MinMessages {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.messages <= self.min_messages
    }
}

/// Stops when a superstep sends more than the given number of messages.
#[derive(Debug, Clone)]
pub struct MaxMessages {
    max_messages: u64,
}

impl From<u64> for MaxMessages {
    fn from(max_messages: u64) -> Self {
        MaxMessages { max_messages }
    }
}

impl Display for MaxMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max messages: {})", self.max_messages))
    }
}

impl PredicateReflection for MaxMessages {}

impl Predicate<PredParams> for MaxMessages {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.messages > self.max_messages
    }
}
