/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::BTreeMap;
use std::fmt::Display;

/// Summary statistics of the sizes of a family of components.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentStats {
    /// The number of components.
    pub count: usize,
    /// The average size, or NaN if there are no components.
    pub mean: f64,
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// Maps each size to the number of components of that size.
    pub histogram: BTreeMap<usize, usize>,
}

impl ComponentStats {
    /// Computes statistics from the sizes of the components.
    pub fn from_sizes(sizes: impl IntoIterator<Item = usize>) -> Self {
        let mut histogram = BTreeMap::new();
        let mut count = 0;
        let mut sum = 0;
        for size in sizes {
            *histogram.entry(size).or_insert(0) += 1;
            count += 1;
            sum += size;
        }
        Self {
            count,
            mean: sum as f64 / count as f64,
            min: histogram.keys().next().copied(),
            max: histogram.keys().next_back().copied(),
            histogram,
        }
    }
}

impl Display for ComponentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let or_dashes = |x: Option<usize>| x.map_or("--".to_string(), |x| x.to_string());
        writeln!(f, "count: {}", self.count)?;
        writeln!(f, "avg:   {:.3}", self.mean)?;
        writeln!(f, "min:   {}", or_dashes(self.min))?;
        writeln!(f, "max:   {}", or_dashes(self.max))?;
        writeln!(f, "size\t| count")?;
        for (size, count) in &self.histogram {
            writeln!(f, "{size}\t| {count}")?;
        }
        Ok(())
    }
}
