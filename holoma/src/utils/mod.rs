/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities.

mod granularity;
pub use granularity::*;

/// Minimum length of the sequential slices handed to Rayon by per-vertex
/// parallel iterators.
pub const RAYON_MIN_LEN: usize = 1024;
