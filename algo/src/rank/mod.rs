/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Batched personalized PageRank over enriched components.
//!
//! The [normalizer](norm) computes once, for each vertex and each of its
//! enriched components, the sum of the weights of the arcs towards other
//! members of the component. The [PageRank](ppr) computation then uses these
//! sums to turn arc weights into transition probabilities, keeping for each
//! vertex a [table](table) of ranks indexed by component and source.

pub mod norm;
pub mod ppr;
pub mod table;
