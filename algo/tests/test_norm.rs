/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use holoma::graphs::attributed::{AttributedGraph, Edge, EdgeKind};
use holoma_algo::enrichment::Membership;
use holoma_algo::rank::norm::normalize;

#[test]
fn test_sums() {
    let graph = AttributedGraph::new(
        3,
        [
            Edge::new(0, 1, EdgeKind::Equivalence, 1.0),
            // Parallel arc
            Edge::new(0, 1, EdgeKind::Hierarchy, 2.0),
            // Self-loop
            Edge::new(0, 0, EdgeKind::Hierarchy, 0.5),
            Edge::new(0, 2, EdgeKind::Hierarchy, 4.0),
            Edge::new(1, 0, EdgeKind::Equivalence, 1.0),
        ],
    );
    // Component 0 is {0, 1}, component 2 is {0, 2}
    let membership = Membership::new([vec![0, 2], vec![0], vec![2]]);
    let norm = normalize(&graph, &membership);

    assert_eq!(norm.num_nodes(), 3);
    assert_eq!(norm.get(0, 0), 3.5);
    assert_eq!(norm.get(0, 2), 4.5);
    assert_eq!(norm.get(1, 0), 1.0);
    assert_eq!(norm.entries_of(0), &[(0, 3.5), (2, 4.5)]);
    assert_eq!(norm.num_entries(), 4);

    // No entry outside the components of a vertex
    assert_eq!(norm.get(1, 2), 0.0);
    assert!(!norm.is_dangling(1, 2));

    // Vertex 2 has no arcs at all
    assert!(norm.is_dangling(2, 2));
    assert_eq!(norm.dangling().collect::<Vec<_>>(), vec![(2, 2)]);
}

#[test]
fn test_arcs_leaving_the_component() {
    // Z = 2 belongs to {0, 1, 2}, but its only arc goes to 3
    let graph = AttributedGraph::new(
        4,
        [
            Edge::equivalence(0, 1),
            Edge::equivalence(1, 0),
            Edge::hierarchy(1, 2),
            Edge::hierarchy(2, 3),
        ],
    );
    let membership = Membership::new([vec![0], vec![0], vec![0], vec![]]);
    let norm = normalize(&graph, &membership);
    assert_eq!(norm.get(1, 0), 2.0);
    assert_eq!(norm.get(2, 0), 0.0);
    assert!(norm.is_dangling(2, 0));
    assert!(norm.entries_of(3).is_empty());
    assert_eq!(norm.dangling().collect::<Vec<_>>(), vec![(2, 0)]);
}

#[test]
#[should_panic(expected = "The membership has 2 vertices, but the graph has 3")]
fn test_size_mismatch() {
    let graph = AttributedGraph::empty(3);
    let membership = Membership::new([vec![0], vec![0]]);
    normalize(&graph, &membership);
}
