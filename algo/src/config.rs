/*
 * SPDX-FileCopyrightText: 2025 Holoma developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parameters of the [pipeline](crate::pipeline).

use holoma::utils::Granularity;

/// Errors found by [`Config::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("The teleport probability must be in (0 . . 1), got {0}")]
    TeleportProb(f64),
    #[error("The maximum number of iterations ({name}) must be positive")]
    ZeroIterations { name: &'static str },
    #[error("The {name} must be nonnegative, got {value}")]
    NegativeThreshold { name: &'static str, value: f64 },
    #[error("Empty size range for {name}: [{min} . . {max}]")]
    SizeRange {
        name: &'static str,
        min: usize,
        max: usize,
    },
}

/// All parameters of a matching run.
///
/// By [default](Config::default), components are enriched up to two hops,
/// the teleport probability is one half, and each phase runs at most ten
/// supersteps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum number of hops of the enrichment.
    pub depth: usize,
    /// Minimum size of a base component.
    pub min_cc_size: usize,
    /// Maximum size of a base component.
    pub max_cc_size: usize,
    /// Whether to discard base components made of a single vertex.
    pub drop_singletons: bool,
    /// Minimum number of members of an enriched component.
    pub min_enriched_size: usize,
    /// Maximum number of members of an enriched component.
    pub max_enriched_size: usize,
    /// Restart probability of the personalized PageRank.
    pub teleport_prob: f64,
    /// Maximum number of supersteps of label propagation.
    pub max_iter: usize,
    /// Maximum number of supersteps of personalized PageRank.
    pub max_iter_ppr: usize,
    /// A vertex stops propagating rank variations whose ℓ₁ norm is at most
    /// this value.
    pub epsilon: f64,
    /// Rank contributions whose absolute value is at most this value are not
    /// sent.
    pub prune_threshold: f64,
    pub granularity: Granularity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 2,
            min_cc_size: 1,
            max_cc_size: usize::MAX,
            drop_singletons: true,
            min_enriched_size: 0,
            max_enriched_size: usize::MAX,
            teleport_prob: 0.5,
            max_iter: 10,
            max_iter_ppr: 10,
            epsilon: 0.001,
            prune_threshold: 0.005,
            granularity: Granularity::default(),
        }
    }
}

impl Config {
    /// Checks that all parameters are within their domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.teleport_prob.is_nan() || self.teleport_prob <= 0.0 || self.teleport_prob >= 1.0 {
            return Err(ConfigError::TeleportProb(self.teleport_prob));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::ZeroIterations { name: "max_iter" });
        }
        if self.max_iter_ppr == 0 {
            return Err(ConfigError::ZeroIterations {
                name: "max_iter_ppr",
            });
        }
        for (name, value) in [
            ("epsilon", self.epsilon),
            ("pruning threshold", self.prune_threshold),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::NegativeThreshold { name, value });
            }
        }
        if self.min_cc_size > self.max_cc_size {
            return Err(ConfigError::SizeRange {
                name: "base components",
                min: self.min_cc_size,
                max: self.max_cc_size,
            });
        }
        if self.min_enriched_size > self.max_enriched_size {
            return Err(ConfigError::SizeRange {
                name: "enriched components",
                min: self.min_enriched_size,
                max: self.max_enriched_size,
            });
        }
        Ok(())
    }
}
