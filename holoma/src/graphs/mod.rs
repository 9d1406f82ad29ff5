/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph representations.

pub mod attributed;

pub mod prelude {
    pub use super::attributed::{Arc, AttributedGraph, ComponentId, Edge, EdgeKind, VertexId};
}
