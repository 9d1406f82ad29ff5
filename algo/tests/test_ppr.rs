/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use holoma::bsp::preds::MaxSupersteps;
use holoma::graphs::attributed::{AttributedGraph, Edge, EdgeKind};
use holoma::utils::Granularity;
use holoma_algo::enrichment::Membership;
use holoma_algo::rank::norm::{NormTable, normalize};
use holoma_algo::rank::ppr::{PersonalizedPageRank, Sources};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A weighted cycle on `n` vertices plus random weighted chords: no vertex
/// is dangling.
fn random_strongly_connected(n: usize, chords: usize, seed: u64) -> AttributedGraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut edges = (0..n)
        .map(|v| Edge::new(v, (v + 1) % n, EdgeKind::Hierarchy, 1.0))
        .collect::<Vec<_>>();
    for _ in 0..chords {
        let kind = if rng.random_bool(0.5) {
            EdgeKind::Equivalence
        } else {
            EdgeKind::Hierarchy
        };
        edges.push(Edge::new(
            rng.random_range(0..n),
            rng.random_range(0..n),
            kind,
            rng.random_range(0.1..2.0),
        ));
    }
    AttributedGraph::new(n, edges)
}

/// Dense Jacobi iteration restricted to component `c`, starting from the
/// indicator vector of `s`, for `iters` iterations.
fn reference_ppr(
    graph: &AttributedGraph,
    membership: &Membership,
    norm: &NormTable,
    c: usize,
    s: usize,
    alpha: f64,
    iters: usize,
) -> Vec<f64> {
    let n = graph.num_nodes();
    let mut r = vec![0.0; n];
    r[s] = 1.0;
    for _ in 0..iters {
        let mut next = vec![0.0; n];
        next[s] = alpha;
        for v in 0..n {
            if !membership.contains(v, c) || norm.get(v, c) == 0.0 {
                continue;
            }
            for arc in graph.successors(v) {
                if membership.contains(arc.dst, c) {
                    next[arc.dst] += (1.0 - alpha) * r[v] * arc.weight / norm.get(v, c);
                }
            }
        }
        r = next;
    }
    r
}

#[test]
fn test_two_vertices() -> Result<()> {
    init_logger();
    // X <-> Y, α = 0.5: X keeps 2/3 and Y gets 1/3
    let graph = AttributedGraph::new(2, [Edge::equivalence(0, 1), Edge::equivalence(1, 0)]);
    let membership = Membership::new([vec![0], vec![0]]);
    let norm = normalize(&graph, &membership);

    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    ppr.teleport_prob(0.5).epsilon(0.0).prune_threshold(0.0);
    let result = ppr.run(MaxSupersteps::try_from(100)?)?;

    for (s, t) in [(0, 1), (1, 0)] {
        assert!((result.get(0, s, s) - 2.0 / 3.0).abs() < 1E-9);
        assert!((result.get(0, s, t) - 1.0 / 3.0).abs() < 1E-9);
        assert!((result.mass(0, s) - 1.0).abs() < 1E-9);
    }
    assert_eq!(result.components().collect::<Vec<_>>(), vec![0]);
    assert_eq!(result.sources(0).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(result.num_vectors(), 2);
    assert_eq!(result.num_entries(), 4);
    assert_eq!(ppr.dropped(), 0);
    Ok(())
}

#[test]
fn test_exact_against_dense() -> Result<()> {
    init_logger();
    let alpha = 0.15;
    for seed in 0..3 {
        let graph = random_strongly_connected(30, 60, seed);
        let membership = Membership::new((0..30).map(|_| vec![7]));
        let norm = normalize(&graph, &membership);
        assert_eq!(norm.dangling().count(), 0);

        let supersteps = 300;
        let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
        ppr.teleport_prob(alpha)
            .epsilon(0.0)
            .prune_threshold(0.0)
            .granularity(Granularity::Vertices(4));
        let result = ppr.run(MaxSupersteps::try_from(supersteps)?)?;
        assert_eq!(ppr.supersteps(), supersteps);

        for s in 0..30 {
            // The last superstep holds the iterate of the previous ones
            let expected = reference_ppr(&graph, &membership, &norm, 7, s, alpha, supersteps - 1);
            for (t, &rank) in expected.iter().enumerate() {
                assert!(
                    (result.get(7, s, t) - rank).abs() < 1E-9,
                    "source {s}, target {t}: {} != {rank}",
                    result.get(7, s, t)
                );
            }
            // No dangling vertices: mass is conserved
            assert!((result.mass(7, s) - 1.0).abs() < 1E-9);
        }
    }
    Ok(())
}

#[test]
fn test_mass_within_epsilon() -> Result<()> {
    init_logger();
    for (seed, n) in [10, 50, 200].into_iter().enumerate() {
        let graph = random_strongly_connected(n, 2 * n, seed as u64);
        let membership = Membership::new((0..n).map(|_| vec![0]));
        let norm = normalize(&graph, &membership);

        // Default ε, but every contribution is sent
        let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
        ppr.prune_threshold(0.0);
        let result = ppr.run(MaxSupersteps::try_from(1000)?)?;
        assert!(ppr.converged());
        for s in 0..n {
            let mass = result.mass(0, s);
            assert!(
                (mass - 1.0).abs() <= PersonalizedPageRank::DEFAULT_EPSILON,
                "n = {n}, source {s}: mass {mass}"
            );
        }
    }
    Ok(())
}

#[test]
fn test_self_rank_floor() -> Result<()> {
    let alpha = 0.3;
    let graph = random_strongly_connected(20, 50, 0);
    let membership = Membership::new((0..20).map(|_| vec![0]));
    let norm = normalize(&graph, &membership);
    for supersteps in 2..8 {
        let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
        ppr.teleport_prob(alpha).epsilon(0.0).prune_threshold(0.0);
        let result = ppr.run(MaxSupersteps::try_from(supersteps)?)?;
        for s in 0..20 {
            assert!(result.get(0, s, s) >= alpha - 1E-12);
        }
    }
    Ok(())
}

#[test]
fn test_single_source() -> Result<()> {
    let graph = random_strongly_connected(25, 80, 1);
    let membership = Membership::new((0..25).map(|v| if v < 20 { vec![0, 1] } else { vec![1] }));
    let norm = normalize(&graph, &membership);

    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    ppr.epsilon(0.0).prune_threshold(0.0);
    let all = ppr.run(MaxSupersteps::try_from(50)?)?;

    ppr.sources(Sources::Single(3));
    let single = ppr.run(MaxSupersteps::try_from(50)?)?;
    assert_eq!(single.sources(0).collect::<Vec<_>>(), vec![3]);
    assert_eq!(single.sources(1).collect::<Vec<_>>(), vec![3]);
    for c in [0, 1] {
        let vector = single.vector(c, 3).expect("missing vector");
        for (&t, &rank) in vector {
            assert!((all.get(c, 3, t) - rank).abs() < 1E-9);
        }
        for (&t, &rank) in all.vector(c, 3).expect("missing vector") {
            assert!((single.get(c, 3, t) - rank).abs() < 1E-9);
        }
    }
    Ok(())
}

#[test]
fn test_component_containment() -> Result<()> {
    init_logger();
    let mut rng = SmallRng::seed_from_u64(2);
    let graph = random_strongly_connected(60, 200, 2);
    let membership = Membership::new((0..60).map(|_| {
        [0, 1, 2]
            .into_iter()
            .filter(|_| rng.random_bool(0.5))
            .collect::<Vec<_>>()
    }));
    let norm = normalize(&graph, &membership);

    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    let result = ppr.run(MaxSupersteps::try_from(30)?)?;
    assert_eq!(ppr.dropped(), 0);
    for (c, s, t, _) in result.iter() {
        assert!(membership.contains(s, c));
        assert!(membership.contains(t, c));
    }
    for v in 0..60 {
        for &c in membership.components_of(v) {
            assert!(result.vector(c, v).is_some());
        }
    }
    Ok(())
}

#[test]
fn test_dangling_vertex() -> Result<()> {
    // Z = 2 belongs to {0, 1, 2}, but its only arc leaves the component
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

    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    ppr.epsilon(0.0).prune_threshold(0.0);
    let result = ppr.run(MaxSupersteps::try_from(60)?)?;
    assert_eq!(ppr.dropped(), 0);

    // Z receives rank, but never forwards any
    assert!(result.get(0, 0, 2) > 0.0);
    assert_eq!(
        result.vector(0, 2).map(|v| v.iter().map(|(&t, &r)| (t, r)).collect::<Vec<_>>()),
        Some(vec![(2, 0.5)])
    );
    // Rank leaks out of the component through Z
    assert!(result.mass(0, 0) < 1.0);
    // Vertex 3 belongs to no component
    assert!(result.iter().all(|(_, s, t, _)| s != 3 && t != 3));
    Ok(())
}

#[test]
fn test_approximate() -> Result<()> {
    let graph = random_strongly_connected(10, 20, 3);
    let membership = Membership::new((0..10).map(|_| vec![0]));
    let norm = normalize(&graph, &membership);

    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    let result = ppr.run(MaxSupersteps::try_from(100)?)?;
    assert!(ppr.converged());
    assert!(ppr.supersteps() < 100);

    let mut exact = PersonalizedPageRank::new(&graph, &membership, &norm);
    exact.epsilon(0.0).prune_threshold(0.0);
    let exact = exact.run(MaxSupersteps::try_from(100)?)?;
    assert!(result.num_entries() <= exact.num_entries());
    for (c, s, t, rank) in exact.iter() {
        assert!((result.get(c, s, t) - rank).abs() < 0.1);
    }
    Ok(())
}

#[test]
fn test_cap_stops_run() -> Result<()> {
    let graph = random_strongly_connected(10, 20, 4);
    let membership = Membership::new((0..10).map(|_| vec![0]));
    let norm = normalize(&graph, &membership);
    let mut ppr = PersonalizedPageRank::new(&graph, &membership, &norm);
    ppr.epsilon(0.0).prune_threshold(0.0);
    ppr.run(MaxSupersteps::try_from(5)?)?;
    assert_eq!(ppr.supersteps(), 5);
    assert!(!ppr.converged());
    Ok(())
}

#[test]
fn test_size_mismatch() {
    let graph = AttributedGraph::empty(3);
    let membership = Membership::new([vec![0], vec![0], vec![0]]);
    let norm = normalize(&graph, &membership);
    let smaller = AttributedGraph::empty(2);
    let mut ppr = PersonalizedPageRank::new(&smaller, &membership, &norm);
    assert!(ppr.run(MaxSupersteps::try_from(5).unwrap()).is_err());
}

#[test]
#[should_panic(expected = "teleport probability")]
fn test_teleport_prob_one() {
    let graph = AttributedGraph::empty(1);
    let membership = Membership::new([vec![0]]);
    let norm = normalize(&graph, &membership);
    PersonalizedPageRank::new(&graph, &membership, &norm).teleport_prob(1.0);
}

#[test]
#[should_panic(expected = "teleport probability")]
fn test_teleport_prob_zero() {
    let graph = AttributedGraph::empty(1);
    let membership = Membership::new([vec![0]]);
    let norm = normalize(&graph, &membership);
    PersonalizedPageRank::new(&graph, &membership, &norm).teleport_prob(0.0);
}

#[test]
#[should_panic(expected = "does not exist")]
fn test_missing_source() {
    let graph = AttributedGraph::empty(1);
    let membership = Membership::new([vec![0]]);
    let norm = normalize(&graph, &membership);
    PersonalizedPageRank::new(&graph, &membership, &norm).sources(Sources::Single(1));
}
