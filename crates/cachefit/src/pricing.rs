//! Price-list fetching and filtering.
//!
//! Uses the public AWS price-list offer files (no credentials required):
//! one JSON document per region for the `AmazonElastiCache` service, carrying
//! product attributes and on-demand price terms keyed by SKU.

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://pricing.us-east-1.amazonaws.com";
const SERVICE_CODE: &str = "AmazonElastiCache";

/// One pricing record as it comes off the wire, before validation.
///
/// Fields stay optional here; [`Catalog::build`](crate::Catalog::build) is
/// where missing or malformed values become hard errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOffering {
    pub instance_type: Option<String>,
    pub memory: Option<String>,
    pub price_per_hour: Option<String>,
}

/// Which products to keep from the offer document.
///
/// The defaults restrict to current-generation, memory-optimized Redis nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfferFilter {
    /// Keep all instance families, not only memory-optimized ones.
    pub any_family: bool,
    /// Keep old-generation node types too.
    pub any_generation: bool,
}

/// HTTP client for the price-list API.
pub struct PricingClient {
    client: Client,
    base_url: Url,
}

impl PricingClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default price-list endpoint.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        let base_url = Url::parse(base_url).context("invalid price-list URL")?;
        Ok(Self { client, base_url })
    }

    /// Fetch the offer document for `region` and reduce it to raw offerings.
    pub async fn fetch_offerings(
        &self,
        region: &str,
        filter: OfferFilter,
    ) -> Result<Vec<RawOffering>> {
        let path = format!("/offers/v1.0/aws/{SERVICE_CODE}/current/{region}/index.json");
        let url = self.base_url.join(&path).context("invalid region path")?;

        info!(region, "fetching offer document");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to fetch price list")?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("no {SERVICE_CODE} price list for region {region:?}, is the region name valid?");
        }
        if !response.status().is_success() {
            anyhow::bail!("price-list API error ({}) for region {region:?}", response.status());
        }
        let index: OfferIndex = response
            .json()
            .await
            .context("failed to parse offer document")?;

        let offerings = raw_offerings(&index, filter);
        debug!(
            region,
            products = index.products.len(),
            kept = offerings.len(),
            "filtered offer document"
        );
        Ok(offerings)
    }
}

/// Select matching products from a parsed offer document.
///
/// Keeps Redis cache nodes, subject to the family/generation filter, and
/// attaches the USD rate of the product's first on-demand price dimension.
/// SKUs without an on-demand term (reserved-only offerings) are skipped.
pub fn raw_offerings(index: &OfferIndex, filter: OfferFilter) -> Vec<RawOffering> {
    let mut out = Vec::new();
    for (sku, product) in &index.products {
        let attr = |name: &str| product.attributes.get(name).map(String::as_str);
        if attr("cacheEngine") != Some("Redis") {
            continue;
        }
        if !filter.any_family && attr("instanceFamily") != Some("Memory optimized") {
            continue;
        }
        if !filter.any_generation && attr("currentGeneration") != Some("Yes") {
            continue;
        }
        let Some(term) = index
            .terms
            .on_demand
            .get(sku)
            .and_then(|terms| terms.values().next())
        else {
            continue;
        };
        let price_per_hour = term
            .price_dimensions
            .values()
            .next()
            .and_then(|d| d.price_per_unit.get("USD"))
            .cloned();
        out.push(RawOffering {
            instance_type: product.attributes.get("instanceType").cloned(),
            memory: product.attributes.get("memory").cloned(),
            price_per_hour,
        });
    }
    out
}

// Offer document shapes, reduced to the fields the selection needs.

#[derive(Debug, Default, Deserialize)]
pub struct OfferIndex {
    #[serde(default)]
    pub products: HashMap<String, Product>,
    #[serde(default)]
    pub terms: Terms,
}

#[derive(Debug, Default, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Terms {
    #[serde(rename = "OnDemand", default)]
    pub on_demand: HashMap<String, HashMap<String, Term>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Term {
    #[serde(rename = "priceDimensions", default)]
    pub price_dimensions: HashMap<String, PriceDimension>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceDimension {
    #[serde(rename = "pricePerUnit", default)]
    pub price_per_unit: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "products": {
            "SKU1": {
                "attributes": {
                    "instanceType": "cache.r6g.large",
                    "memory": "13.07 GiB",
                    "cacheEngine": "Redis",
                    "instanceFamily": "Memory optimized",
                    "currentGeneration": "Yes"
                }
            },
            "SKU2": {
                "attributes": {
                    "instanceType": "cache.t3.micro",
                    "memory": "0.5 GiB",
                    "cacheEngine": "Redis",
                    "instanceFamily": "Standard",
                    "currentGeneration": "Yes"
                }
            },
            "SKU3": {
                "attributes": {
                    "instanceType": "cache.r3.large",
                    "memory": "13.5 GiB",
                    "cacheEngine": "Redis",
                    "instanceFamily": "Memory optimized",
                    "currentGeneration": "No"
                }
            },
            "SKU4": {
                "attributes": {
                    "instanceType": "cache.r6g.large",
                    "memory": "13.07 GiB",
                    "cacheEngine": "Memcached",
                    "instanceFamily": "Memory optimized",
                    "currentGeneration": "Yes"
                }
            },
            "SKU5": {
                "attributes": {
                    "instanceType": "cache.r6g.xlarge",
                    "memory": "26.32 GiB",
                    "cacheEngine": "Redis",
                    "instanceFamily": "Memory optimized",
                    "currentGeneration": "Yes"
                }
            }
        },
        "terms": {
            "OnDemand": {
                "SKU1": {
                    "SKU1.TERM": {
                        "priceDimensions": {
                            "SKU1.TERM.DIM": {"pricePerUnit": {"USD": "0.2060000000"}}
                        }
                    }
                },
                "SKU2": {
                    "SKU2.TERM": {
                        "priceDimensions": {
                            "SKU2.TERM.DIM": {"pricePerUnit": {"USD": "0.0170000000"}}
                        }
                    }
                },
                "SKU3": {
                    "SKU3.TERM": {
                        "priceDimensions": {
                            "SKU3.TERM.DIM": {"pricePerUnit": {"USD": "0.2540000000"}}
                        }
                    }
                }
            }
        }
    }"#;

    fn sample_index() -> OfferIndex {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_default_filter_keeps_current_memory_optimized_redis() {
        let mut got = raw_offerings(&sample_index(), OfferFilter::default());
        got.sort_by(|a, b| a.instance_type.cmp(&b.instance_type));
        // SKU5 has no on-demand term, SKU2 is the wrong family, SKU3 the
        // wrong generation, SKU4 the wrong engine.
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].instance_type.as_deref(), Some("cache.r6g.large"));
        assert_eq!(got[0].memory.as_deref(), Some("13.07 GiB"));
        assert_eq!(got[0].price_per_hour.as_deref(), Some("0.2060000000"));
    }

    #[test]
    fn test_any_family_includes_standard_nodes() {
        let filter = OfferFilter {
            any_family: true,
            any_generation: false,
        };
        let mut types: Vec<_> = raw_offerings(&sample_index(), filter)
            .into_iter()
            .filter_map(|o| o.instance_type)
            .collect();
        types.sort();
        assert_eq!(types, vec!["cache.r6g.large", "cache.t3.micro"]);
    }

    #[test]
    fn test_any_generation_includes_old_nodes() {
        let filter = OfferFilter {
            any_family: false,
            any_generation: true,
        };
        let mut types: Vec<_> = raw_offerings(&sample_index(), filter)
            .into_iter()
            .filter_map(|o| o.instance_type)
            .collect();
        types.sort();
        assert_eq!(types, vec!["cache.r3.large", "cache.r6g.large"]);
    }

    #[tokio::test]
    async fn test_fetch_offerings_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/offers/v1.0/aws/AmazonElastiCache/current/eu-west-1/index.json",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE)
            .create_async()
            .await;

        let client = PricingClient::with_base_url(&server.url()).unwrap();
        let got = client
            .fetch_offerings("eu-west-1", OfferFilter::default())
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].instance_type.as_deref(), Some("cache.r6g.large"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_offerings_unknown_region() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/offers/v1.0/aws/AmazonElastiCache/current/mars-north-1/index.json",
            )
            .with_status(404)
            .create_async()
            .await;

        let client = PricingClient::with_base_url(&server.url()).unwrap();
        let err = client
            .fetch_offerings("mars-north-1", OfferFilter::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mars-north-1"));
    }
}
