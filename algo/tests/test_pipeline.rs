/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use holoma::graphs::attributed::{AttributedGraph, Edge};
use holoma_algo::config::{Config, ConfigError};
use holoma_algo::eval::best_friends;
use holoma_algo::pipeline::Pipeline;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two small ontologies, 0..5 and 5..10, each a hierarchy chain, with the
/// equivalences 0 = 5 and 3 = 8 = 9.
fn two_ontologies() -> AttributedGraph {
    let mut edges = vec![];
    for (u, v) in [(0, 1), (1, 2), (2, 3), (3, 4), (5, 6), (6, 7), (7, 8), (8, 9)] {
        edges.push(Edge::hierarchy(u, v));
        edges.push(Edge::hierarchy(v, u));
    }
    for (u, v) in [(0, 5), (3, 8), (8, 9)] {
        edges.push(Edge::equivalence(u, v));
        edges.push(Edge::equivalence(v, u));
    }
    AttributedGraph::new(10, edges)
}

#[test]
fn test_end_to_end() -> Result<()> {
    init_logger();
    let graph = two_ontologies();
    let output = Pipeline::new(&graph, Config::default())?.run()?;

    assert_eq!(output.components.labels(), &[0, 1, 2, 3, 4, 0, 6, 7, 3, 3]);
    // Singletons are dropped by default
    assert_eq!(output.base.ids().collect::<Vec<_>>(), vec![0, 3]);

    // Base members keep their base component
    for (c, members) in output.base.iter() {
        for &v in members {
            assert!(output.membership.contains(v, c));
        }
    }
    // Two hops in each ontology
    assert_eq!(output.membership.members(0), vec![0, 1, 2, 5, 6, 7]);
    assert_eq!(output.membership.members(3), vec![1, 2, 3, 4, 6, 7, 8, 9]);
    assert_eq!(output.membership.components_of(7), &[0, 3]);
    assert_eq!(output.norm.num_nodes(), 10);

    // Every member is a source, and ranks stay inside the component
    for c in [0, 3] {
        assert_eq!(
            output.ranks.sources(c).collect::<Vec<_>>(),
            output.membership.members(c)
        );
    }
    for (c, s, t, rank) in output.ranks.iter() {
        assert!(output.membership.contains(s, c));
        assert!(output.membership.contains(t, c));
        assert!(rank.is_finite());
    }
    for c in [0, 3] {
        for s in output.membership.members(c) {
            assert!(output.ranks.get(c, s, s) > 0.0);
            assert!(!best_friends(output.ranks.vector(c, s).expect("missing vector"), |t| t == s)
                .is_empty());
        }
    }
    Ok(())
}

#[test]
fn test_no_enrichment() -> Result<()> {
    let graph = two_ontologies();
    let config = Config {
        depth: 0,
        ..Config::default()
    };
    let output = Pipeline::new(&graph, config)?.run()?;
    assert_eq!(output.membership.members(0), vec![0, 5]);
    assert_eq!(output.membership.members(3), vec![3, 8, 9]);
    assert_eq!(output.ranks.sources(3).collect::<Vec<_>>(), vec![3, 8, 9]);
    Ok(())
}

#[test]
fn test_unbounded_depth() -> Result<()> {
    let graph = two_ontologies();
    let config = Config {
        depth: usize::MAX,
        ..Config::default()
    };
    assert_eq!(config.validate(), Ok(()));
    let output = Pipeline::new(&graph, config)?.run()?;
    // Every vertex is reachable from both base components
    assert_eq!(output.membership.members(0), (0..10).collect::<Vec<_>>());
    assert_eq!(output.membership.members(3), (0..10).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_size_filters() -> Result<()> {
    let graph = two_ontologies();
    let config = Config {
        min_cc_size: 3,
        ..Config::default()
    };
    let output = Pipeline::new(&graph, config)?.run()?;
    assert_eq!(output.base.ids().collect::<Vec<_>>(), vec![3]);
    assert_eq!(output.ranks.components().collect::<Vec<_>>(), vec![3]);

    let config = Config {
        max_enriched_size: 7,
        ..Config::default()
    };
    let output = Pipeline::new(&graph, config)?.run()?;
    assert_eq!(output.base.ids().collect::<Vec<_>>(), vec![0, 3]);
    assert_eq!(output.ranks.components().collect::<Vec<_>>(), vec![0]);
    Ok(())
}

#[test]
fn test_invalid_config() {
    let graph = two_ontologies();
    let config = Config {
        teleport_prob: 1.0,
        ..Config::default()
    };
    let err = Pipeline::new(&graph, config).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration"));
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::TeleportProb(1.0))
    );
}

#[test]
fn test_validate() {
    assert_eq!(Config::default().validate(), Ok(()));

    let config = Config {
        teleport_prob: f64::NAN,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::TeleportProb(_))));

    let config = Config {
        max_iter_ppr: 0,
        ..Config::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::ZeroIterations {
            name: "max_iter_ppr"
        })
    );

    let config = Config {
        epsilon: -1.0,
        ..Config::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::NegativeThreshold {
            name: "epsilon",
            value: -1.0
        })
    );

    let config = Config {
        min_cc_size: 5,
        max_cc_size: 4,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::SizeRange { .. })));
}

#[cfg(feature = "serde")]
#[test]
fn test_config_serde() -> Result<()> {
    let config: Config = serde_json::from_str(r#"{"depth": 3, "teleport_prob": 0.15}"#)?;
    assert_eq!(config.depth, 3);
    assert_eq!(config.teleport_prob, 0.15);
    assert_eq!(config.max_iter, Config::default().max_iter);
    Ok(())
}
