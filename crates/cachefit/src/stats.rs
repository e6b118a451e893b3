//! Memory stats collection from running Redis-compatible servers.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

/// Per-fetch wall-clock budget; a stuck server must not hold up the run.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A snapshot of one server's memory state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub addr: String,
    pub used_bytes: u64,
    pub peak_bytes: u64,
}

impl ServerStats {
    pub fn used_gib(&self) -> f64 {
        (self.used_bytes >> 20) as f64 / 1024.0
    }

    pub fn peak_gib(&self) -> f64 {
        (self.peak_bytes >> 20) as f64 / 1024.0
    }
}

/// Fetch used and peak memory from the server at `addr` (`HOST:PORT`).
pub async fn fetch_stats(addr: &str) -> Result<ServerStats> {
    let client = redis::Client::open(format!("redis://{addr}"))
        .with_context(|| format!("invalid server address {addr:?}"))?;
    let fetch = async {
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .with_context(|| format!("failed to connect to {addr}"))?;
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .with_context(|| format!("INFO memory failed for {addr}"))?;
        anyhow::Ok(info)
    };
    let info = tokio::time::timeout(FETCH_TIMEOUT, fetch)
        .await
        .with_context(|| format!("timed out fetching memory stats from {addr}"))??;

    let (used_bytes, peak_bytes) = parse_memory_info(&info)?;
    debug!(addr, used_bytes, peak_bytes, "fetched server memory stats");
    Ok(ServerStats {
        addr: addr.to_string(),
        used_bytes,
        peak_bytes,
    })
}

/// Parse `used_memory` and `used_memory_peak` out of an `INFO memory` payload.
///
/// Stops scanning once both values are seen. Missing lines yield zero, which
/// is also what a server genuinely reporting zero produces.
pub fn parse_memory_info(info: &str) -> Result<(u64, u64)> {
    let mut used = 0u64;
    let mut peak = 0u64;
    for line in info.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(v) = line.strip_prefix("used_memory:") {
            used = v
                .trim()
                .parse()
                .with_context(|| format!("bad used_memory value {v:?}"))?;
        } else if let Some(v) = line.strip_prefix("used_memory_peak:") {
            peak = v
                .trim()
                .parse()
                .with_context(|| format!("bad used_memory_peak value {v:?}"))?;
        }
        if used > 0 && peak > 0 {
            break;
        }
    }
    Ok((used, peak))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_payload() {
        let info = "# Memory\r\n\
                    used_memory:1134567\r\n\
                    used_memory_human:1.08M\r\n\
                    used_memory_rss:2345678\r\n\
                    used_memory_peak:4567890\r\n\
                    used_memory_peak_human:4.36M\r\n";
        assert_eq!(parse_memory_info(info).unwrap(), (1134567, 4567890));
    }

    #[test]
    fn test_parse_ignores_prefixed_variants() {
        // used_memory_rss etc. share the used_memory prefix but carry their
        // own suffix; only the bare keys may be picked up.
        let info = "used_memory_rss:999\nused_memory:42\nused_memory_peak:43\n";
        assert_eq!(parse_memory_info(info).unwrap(), (42, 43));
    }

    #[test]
    fn test_parse_missing_lines_yield_zero() {
        assert_eq!(parse_memory_info("# Memory\n").unwrap(), (0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage_values() {
        assert!(parse_memory_info("used_memory:lots\n").is_err());
    }

    #[test]
    fn test_gib_display_values() {
        let stats = ServerStats {
            addr: "cache-1:6379".to_string(),
            used_bytes: 3 * 1024 * 1024 * 1024,
            peak_bytes: 512 * 1024 * 1024,
        };
        assert!((stats.used_gib() - 3.0).abs() < 1e-9);
        assert!((stats.peak_gib() - 0.5).abs() < 1e-9);
    }
}
