//! Best-fit matching of server measurements against an offering catalog.

use crate::catalog::{Catalog, Offering};
use crate::error::{MatchError, MemoryMetric, NoFitError};
use crate::stats::ServerStats;

/// One server matched to its used-based and peak-based offerings.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub stats: ServerStats,
    pub used_based: Offering,
    pub peak_based: Offering,
    /// Used memory as a percentage of the used-based offering's capacity.
    pub used_ratio: f64,
    /// Peak memory as a percentage of the peak-based offering's capacity.
    pub peak_ratio: f64,
}

/// Monthly cost totals across a batch of match results.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReportTotals {
    pub used_based_monthly: f64,
    pub peak_based_monthly: f64,
}

impl ReportTotals {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let mut totals = Self::default();
        for row in results {
            totals.used_based_monthly += row.used_based.price_per_month();
            totals.peak_based_monthly += row.peak_based.price_per_month();
        }
        totals
    }
}

/// Match every measurement against the catalog at the given load target.
///
/// All-or-nothing: the first measurement that cannot be matched aborts the
/// batch with no partial results. Output order mirrors input order.
pub fn match_all(
    catalog: &Catalog,
    stats: &[ServerStats],
    max_load_percent: u32,
) -> Result<Vec<MatchResult>, MatchError> {
    let mut results = Vec::with_capacity(stats.len());
    for server in stats {
        let used_based = find_for(catalog, server, MemoryMetric::Used, max_load_percent)?;
        let peak_based = find_for(catalog, server, MemoryMetric::Peak, max_load_percent)?;
        results.push(MatchResult {
            used_ratio: ratio(server.used_bytes, used_based.capacity_bytes),
            peak_ratio: ratio(server.peak_bytes, peak_based.capacity_bytes),
            used_based,
            peak_based,
            stats: server.clone(),
        });
    }
    Ok(results)
}

fn find_for(
    catalog: &Catalog,
    server: &ServerStats,
    metric: MemoryMetric,
    max_load_percent: u32,
) -> Result<Offering, MatchError> {
    let required_bytes = match metric {
        MemoryMetric::Used => server.used_bytes,
        MemoryMetric::Peak => server.peak_bytes,
    };
    catalog
        .find_cheapest_fit(required_bytes, max_load_percent)
        .map(Offering::clone)
        .map_err(|source: NoFitError| MatchError {
            addr: server.addr.clone(),
            metric,
            required_bytes,
            source,
        })
}

fn ratio(bytes: u64, capacity_bytes: u64) -> f64 {
    bytes as f64 / capacity_bytes as f64 * 100.0
}
