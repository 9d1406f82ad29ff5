/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Extraction of results from rank vectors.
//!
//! The _best friends_ of a source are the targets of maximum rank in its
//! vector, and its _worst friends_ those of minimum rank. Ranks closer than
//! [`TIE_TOLERANCE`] are considered equal, so a vector can have several best
//! (or worst) friends.

use holoma::graphs::attributed::VertexId;
use std::collections::BTreeMap;

/// Ranks whose difference is smaller than this value are considered equal.
pub const TIE_TOLERANCE: f64 = 1E-9;

/// Returns the mean of the stored ranks of a vector, or NaN if the vector is
/// empty.
///
/// Targets that were never reached have no stored rank and do not count.
pub fn statistical_mean(vector: &BTreeMap<VertexId, f64>) -> f64 {
    vector.values().sum::<f64>() / vector.len() as f64
}

fn extremes(
    vector: &BTreeMap<VertexId, f64>,
    exclude: impl Fn(VertexId) -> bool,
    better: impl Fn(f64, f64) -> bool,
) -> Vec<(VertexId, f64)> {
    let exclude = &exclude;
    let candidates = move || {
        vector
            .iter()
            .map(|(&t, &rank)| (t, rank))
            .filter(move |&(t, _)| !exclude(t))
    };
    let Some(best) = candidates()
        .map(|(_, rank)| rank)
        .reduce(|a, b| if better(b, a) { b } else { a })
    else {
        return vec![];
    };
    candidates()
        .filter(|&(_, rank)| (rank - best).abs() < TIE_TOLERANCE)
        .collect()
}

/// Returns the targets of maximum rank, with their rank, in increasing
/// order of target.
///
/// Targets for which `exclude` returns true are ignored: pass
/// `|t| t == source` to obtain the _true_ best friends of a source, which
/// excludes the source itself, or a membership test on a set of vertices
/// that cannot be friends.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use holoma_algo::eval::best_friends;
///
/// let vector = BTreeMap::from([(0, 0.5), (1, 0.2), (2, 0.2), (3, 0.1)]);
/// assert_eq!(best_friends(&vector, |_| false), vec![(0, 0.5)]);
/// assert_eq!(best_friends(&vector, |t| t == 0), vec![(1, 0.2), (2, 0.2)]);
/// ```
pub fn best_friends(
    vector: &BTreeMap<VertexId, f64>,
    exclude: impl Fn(VertexId) -> bool,
) -> Vec<(VertexId, f64)> {
    extremes(vector, exclude, |a, b| a > b)
}

/// Returns the targets of minimum rank, with their rank, in increasing
/// order of target.
pub fn worst_friends(vector: &BTreeMap<VertexId, f64>) -> Vec<(VertexId, f64)> {
    extremes(vector, |_| false, |a, b| a < b)
}
