//! Core library for suggesting ElastiCache node types that can hold
//! existing Redis-compatible servers.
//!
//! This crate provides:
//! - The offering catalog and best-fit matching engine
//! - Memory stats collection from running servers
//! - Price-list fetching and filtering
//! - The table of exact per-node-type maxmemory values

pub mod catalog;
pub mod error;
pub mod matcher;
pub mod maxmemory;
pub mod pricing;
pub mod stats;

pub use catalog::{Catalog, Offering};
pub use error::{MalformedOfferingError, MatchError, MemoryMetric, NoFitError};
pub use matcher::{match_all, MatchResult, ReportTotals};
pub use pricing::{OfferFilter, PricingClient, RawOffering};
pub use stats::{fetch_stats, ServerStats};

/// Format a byte count as a human-readable string using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
        assert_eq!(format_bytes(13_201_781_556), "12.30 GiB");
    }
}
