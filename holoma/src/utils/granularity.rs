/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Size of the parallel tasks of a superstep, expressed either by vertices or
/// by arcs.
///
/// The [engine](crate::bsp::Bsp) splits the value array in chunks of
/// contiguous vertices, and each chunk becomes a Rayon task. Work per vertex
/// is roughly proportional to its outdegree, so on skewed graphs it is often
/// more natural to size tasks by arcs; [`vertex_granularity`] converts
/// between the two using the average outdegree.
///
/// [`vertex_granularity`]: Self::vertex_granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Granularity {
    /// Each task is formed by the given number of vertices.
    Vertices(usize),
    /// Each task is formed by a number of vertices whose outdegrees sum,
    /// tentatively, to the given number of arcs.
    Arcs(u64),
}

impl core::default::Default for Granularity {
    /// Returns a default granularity of 1000 vertices.
    fn default() -> Self {
        Self::Vertices(1000)
    }
}

impl Granularity {
    /// Returns the number of vertices per task for a graph with the given
    /// number of vertices and arcs.
    ///
    /// For the variant [`Arcs`](Self::Arcs) the number of vertices is the
    /// number of arcs divided by the average outdegree. The result is never
    /// zero.
    pub fn vertex_granularity(&self, num_nodes: usize, num_arcs: u64) -> usize {
        match self {
            Self::Vertices(n) => (*n).max(1),
            Self::Arcs(n) => {
                let average_degree = num_arcs as f64 / num_nodes.max(1) as f64;
                if average_degree == 0.0 {
                    return num_nodes.max(1);
                }
                (*n as f64 / average_degree)
                    .ceil()
                    .clamp(1.0, usize::MAX as f64) as usize
            }
        }
    }
}
