//! Typed errors surfaced by the catalog and matcher.
//!
//! All of these are deterministic functions of the input data. Transient
//! failures (network, server connectivity) stay with the fetch collaborators
//! and propagate as opaque `anyhow` errors instead.

use thiserror::Error;

use crate::format_bytes;

/// A raw pricing record that cannot be turned into an [`Offering`](crate::Offering).
///
/// Fatal for catalog construction: a corrupt record means the catalog would be
/// incomplete, so the run does not proceed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedOfferingError {
    #[error("pricing record has a missing or empty instance type")]
    MissingInstanceType,

    #[error("{instance_type}: pricing record has no memory attribute")]
    MissingMemory { instance_type: String },

    #[error("{instance_type}: unsupported memory spec, want \"<number> GiB\", got {raw:?}")]
    BadMemorySpec { instance_type: String, raw: String },

    #[error("{instance_type}: unexpected non-positive memory value {raw:?}")]
    NonPositiveMemory { instance_type: String, raw: String },

    #[error("{instance_type}: cannot parse price {raw:?} as a non-negative decimal")]
    BadPrice { instance_type: String, raw: String },
}

/// No offering in the catalog is large enough for the requirement at the
/// given load target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "no offering can hold {} at {max_load_percent}% load",
    format_bytes(*.required_bytes)
)]
pub struct NoFitError {
    pub required_bytes: u64,
    pub max_load_percent: u32,
}

/// Which memory reading of a server failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMetric {
    Used,
    Peak,
}

impl std::fmt::Display for MemoryMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryMetric::Used => f.write_str("used"),
            MemoryMetric::Peak => f.write_str("peak"),
        }
    }
}

/// A [`NoFitError`] tied to the server and metric it occurred for.
///
/// The matcher is all-or-nothing over a batch, so one of these aborts the
/// whole report.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "no matching offering for {addr:?} with {} of {metric} memory: {source}",
    format_bytes(*.required_bytes)
)]
pub struct MatchError {
    pub addr: String,
    pub metric: MemoryMetric,
    pub required_bytes: u64,
    #[source]
    pub source: NoFitError,
}
