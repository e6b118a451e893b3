//! Concurrent collection of server stats and the offering catalog.
//!
//! Per-server fetches run through a bounded task pool; the pricing fetch runs
//! alongside them. Matching must not start until both are complete, and the
//! first failure anywhere cancels everything still in flight.

use std::sync::Arc;

use anyhow::{Context, Result};
use cachefit::{fetch_stats, OfferFilter, PricingClient, RawOffering, ServerStats};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Upper bound on simultaneous server connections.
const MAX_WORKERS: usize = 10;

/// Fetch server stats and the raw offerings concurrently.
///
/// Returns once both sides have finished; the first error wins and the other
/// side is dropped mid-flight.
pub async fn gather(
    addrs: &[String],
    pricing: &PricingClient,
    region: &str,
    filter: OfferFilter,
) -> Result<(Vec<ServerStats>, Vec<RawOffering>)> {
    tokio::try_join!(
        fetch_all_stats(addrs),
        pricing.fetch_offerings(region, filter),
    )
}

/// Fetch memory stats for every address, at most [`MAX_WORKERS`] at a time.
///
/// Results come back in input order. Any single failure aborts the sibling
/// fetches and fails the whole batch.
pub async fn fetch_all_stats(addrs: &[String]) -> Result<Vec<ServerStats>> {
    let semaphore = Arc::new(Semaphore::new(MAX_WORKERS));
    let mut tasks = JoinSet::new();
    for (index, addr) in addrs.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("fetch pool closed")?;
            let stats = fetch_stats(&addr).await?;
            anyhow::Ok((index, stats))
        });
    }

    let mut slots: Vec<Option<ServerStats>> = vec![None; addrs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined.context("stats fetch task panicked")? {
            Ok((index, stats)) => {
                debug!(addr = %stats.addr, "collected server stats");
                slots[index] = Some(stats);
            }
            Err(err) => {
                tasks.abort_all();
                return Err(err);
            }
        }
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .context("stats fetch finished with missing results")
}
