//! cachefit CLI
//!
//! Reads a list of Redis-compatible server addresses, polls each one for its
//! memory footprint, fetches current instance prices, and reports the
//! cheapest node type that holds each server's used and peak memory within a
//! configurable load target.

mod fetch;
mod input;
mod render;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cachefit::{match_all, Catalog, OfferFilter, PricingClient, ReportTotals};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default for the reserved-memory-percent node parameter.
const DEFAULT_RESERVED_MEMORY_PERCENT: u32 = 25;

const RESERVED_MEMORY_NOTE: &str = "\
The reserved-memory-percent node parameter sets aside part of a node's memory
for non-data use (backups, replication buffers). Lowering it below the default
leaves less headroom than the provider recommends; see the managed-cache
documentation before changing it.";

/// Suggest cache instance types that can fit existing servers
#[derive(Parser)]
#[command(name = "cachefit")]
#[command(author, version, about, after_help = RESERVED_MEMORY_NOTE)]
struct Cli {
    /// Use prices for this AWS region
    #[arg(long, env = "CACHEFIT_REGION", default_value = "us-east-1")]
    region: String,

    /// Path to a file with server addresses, one HOST:PORT per line
    /// (/dev/stdin to read from stdin)
    #[arg(long)]
    servers: PathBuf,

    /// Source dataset must fit this percent memory utilization of the target
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u32).range(1..=100))]
    max_load: u32,

    /// Value of the reserved-memory-percent node parameter
    #[arg(long, default_value_t = DEFAULT_RESERVED_MEMORY_PERCENT,
          value_parser = clap::value_parser!(u32).range(0..=100))]
    reserved_memory_percent: u32,

    /// Take all instance families into account, not only memory-optimized
    #[arg(long)]
    any_family: bool,

    /// Take old-generation instance types into account too
    #[arg(long)]
    any_generation: bool,

    /// Output format for the stdout report
    #[arg(long, short, default_value = "table")]
    format: render::OutputFormat,

    /// Write an HTML report to this path instead of printing to stdout
    #[arg(long)]
    html: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    if cli.max_load >= 90 {
        render::print_warning(
            "make sure you understand how much memory is actually usable on a managed cache node \
             before targeting 90%+ load",
        );
    }
    if cli.reserved_memory_percent < DEFAULT_RESERVED_MEMORY_PERCENT {
        render::print_warning(
            "reserved-memory-percent is below the provider default, make sure you understand how \
             the parameter works",
        );
    }

    let file = File::open(&cli.servers)
        .with_context(|| format!("failed to open {}", cli.servers.display()))?;
    let addrs = input::read_addresses(BufReader::new(file))?;
    if addrs.is_empty() {
        bail!("no server addresses to work on");
    }

    let pricing = PricingClient::new()?;
    let filter = OfferFilter {
        any_family: cli.any_family,
        any_generation: cli.any_generation,
    };
    let (stats, raw_offerings) = fetch::gather(&addrs, &pricing, &cli.region, filter).await?;
    if raw_offerings.is_empty() {
        bail!(
            "pricing returned no offerings for region {:?} with the current filters",
            cli.region
        );
    }

    let catalog = Catalog::build(raw_offerings, cli.reserved_memory_percent)?;
    let results = match_all(&catalog, &stats, cli.max_load)?;
    let totals = ReportTotals::from_results(&results);

    match &cli.html {
        Some(path) => {
            let params = render::ReportParams {
                region: cli.region.clone(),
                max_load_percent: cli.max_load,
                reserved_memory_percent: cli.reserved_memory_percent,
                generated_at: Utc::now(),
            };
            let page = render::render_html(&results, totals, &params);
            std::fs::write(path, page)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => render::print_report(&results, totals, cli.format)?,
    }
    Ok(())
}
