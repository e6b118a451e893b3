//! Offering catalog: normalization of raw pricing records into a
//! capacity-ordered, query-ready structure.

use tracing::warn;

use crate::error::{MalformedOfferingError, NoFitError};
use crate::maxmemory;
use crate::pricing::RawOffering;

const GIB: u64 = 1024 * 1024 * 1024;

/// One purchasable cache node configuration.
///
/// `capacity_bytes` is the usable memory after the reserved-memory correction,
/// not the advertised node size.
#[derive(Debug, Clone, PartialEq)]
pub struct Offering {
    pub instance_type: String,
    pub capacity_bytes: u64,
    pub price_per_hour: f64,
}

impl Offering {
    /// Monthly price using the fixed 31-day month convention.
    pub fn price_per_month(&self) -> f64 {
        self.price_per_hour * 24.0 * 31.0
    }

    pub fn capacity_gib(&self) -> f64 {
        (self.capacity_bytes >> 20) as f64 / 1024.0
    }
}

/// Offerings sorted ascending by usable capacity.
///
/// The sort order is what makes [`Catalog::find_cheapest_fit`] a binary
/// search; the catalog is read-only once built.
#[derive(Debug, Default)]
pub struct Catalog {
    offerings: Vec<Offering>,
}

impl Catalog {
    /// Build a catalog from raw pricing records.
    ///
    /// For node types with a published exact maxmemory value that value is the
    /// base; otherwise the advertised memory string is used and a diagnostic
    /// is logged. Either way `reserved_percent` percent of the base is
    /// subtracted to get the usable capacity.
    ///
    /// Fails on the first malformed record: a partial catalog would produce a
    /// misleading report.
    pub fn build(
        records: Vec<RawOffering>,
        reserved_percent: u32,
    ) -> Result<Self, MalformedOfferingError> {
        let mut offerings = Vec::with_capacity(records.len());
        for record in records {
            let instance_type = match record.instance_type {
                Some(it) if !it.is_empty() => it,
                _ => return Err(MalformedOfferingError::MissingInstanceType),
            };
            let price_raw = record.price_per_hour.unwrap_or_default();
            let price_per_hour: f64 = price_raw.trim().parse().map_err(|_| {
                MalformedOfferingError::BadPrice {
                    instance_type: instance_type.clone(),
                    raw: price_raw.clone(),
                }
            })?;
            if !price_per_hour.is_finite() || price_per_hour < 0.0 {
                return Err(MalformedOfferingError::BadPrice {
                    instance_type,
                    raw: price_raw,
                });
            }

            // The advertised size is validated even when the exact value
            // overrides it; a record that fails to parse is a corrupt record.
            let advertised = parse_memory_spec(&instance_type, record.memory.as_deref())?;
            let capacity_bytes = match maxmemory::known_maxmemory(&instance_type) {
                Some(exact) => apply_reserved(exact, reserved_percent),
                None => {
                    warn!(
                        instance_type = %instance_type,
                        reserved_percent,
                        "exact maxmemory value unknown, using advertised size corrected to reserved percent"
                    );
                    apply_reserved(advertised, reserved_percent)
                }
            };

            offerings.push(Offering {
                instance_type,
                capacity_bytes,
                price_per_hour,
            });
        }
        // Capacity ties keep no particular relative order.
        offerings.sort_unstable_by_key(|o| o.capacity_bytes);
        Ok(Self { offerings })
    }

    /// Find the cheapest offering whose load-adjusted capacity holds
    /// `required_bytes`.
    ///
    /// An offering fits when `capacity_bytes / 100 * max_load_percent >=
    /// required_bytes`; the floor division by 100 happens first, which matters
    /// on capacities not evenly divisible by 100. Price is assumed monotonic
    /// in capacity within a filtered offering family, so the smallest fitting
    /// capacity is taken as the cheapest fit; prices themselves are never
    /// compared.
    pub fn find_cheapest_fit(
        &self,
        required_bytes: u64,
        max_load_percent: u32,
    ) -> Result<&Offering, NoFitError> {
        let i = self
            .offerings
            .partition_point(|o| o.capacity_bytes / 100 * u64::from(max_load_percent) < required_bytes);
        self.offerings.get(i).ok_or(NoFitError {
            required_bytes,
            max_load_percent,
        })
    }

    pub fn offerings(&self) -> &[Offering] {
        &self.offerings
    }

    pub fn len(&self) -> usize {
        self.offerings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }
}

/// Subtract `reserved_percent` percent from a memory base, floor-dividing by
/// 100 first to match the node-parameter arithmetic.
fn apply_reserved(base_bytes: u64, reserved_percent: u32) -> u64 {
    base_bytes - base_bytes / 100 * u64::from(reserved_percent)
}

/// Parse an advertised memory attribute of the form `"<number> GiB"`.
fn parse_memory_spec(
    instance_type: &str,
    raw: Option<&str>,
) -> Result<u64, MalformedOfferingError> {
    let raw = raw.ok_or_else(|| MalformedOfferingError::MissingMemory {
        instance_type: instance_type.to_string(),
    })?;
    let gibs: f64 = raw
        .strip_suffix(" GiB")
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| MalformedOfferingError::BadMemorySpec {
            instance_type: instance_type.to_string(),
            raw: raw.to_string(),
        })?;
    if gibs <= 0.0 {
        return Err(MalformedOfferingError::NonPositiveMemory {
            instance_type: instance_type.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok((gibs * GIB as f64) as u64)
}
