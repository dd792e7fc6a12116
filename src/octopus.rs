//! Supplier rate-API integration
//!
//! This module defines the abstract "fetch rates for period" contract the
//! engine consumes, plus the Octopus-style REST implementation: paginated
//! unit-rate and standing-charge endpoints keyed by product and tariff
//! code, with Economy 7 served as separate day and night registers.

use crate::config::ApiConfig;
use crate::error::{FaradayError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::model::{FlowDirection, Rate, RateType, Region, StandingCharge, TariffType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Parameters for one schedule fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Commercial product code
    pub product_code: String,

    /// Full regional tariff code
    pub tariff_code: String,

    /// Structure deciding which endpoints to hit
    pub tariff_type: TariffType,

    /// Import or export
    pub flow_direction: FlowDirection,

    /// Start of the requested window (inclusive)
    pub period_from: DateTime<Utc>,

    /// End of the requested window (exclusive)
    pub period_to: DateTime<Utc>,
}

/// The consumed external capability: supplies rate schedules on request.
///
/// A failed call must leave the caller free to keep its existing schedule;
/// implementations never deliver partial results as success.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Fetch all unit rates for the requested window
    async fn fetch_rates(&self, request: &FetchRequest) -> Result<Vec<Rate>>;

    /// Fetch all standing charges for the requested window (import only)
    async fn fetch_standing_charges(&self, request: &FetchRequest) -> Result<Vec<StandingCharge>>;
}

/// Build a full tariff code from its components.
///
/// Layout: `{fuel}-{payment}-{product}-{region}{suffix}`, e.g.
/// `E-1R-AGILE-FLEX-22-11-25-C` for import and the `-OUTGOING` suffix for
/// export variants.
pub fn build_tariff_code(
    product_code: &str,
    region: Region,
    flow_direction: FlowDirection,
) -> String {
    let suffix = match flow_direction {
        FlowDirection::Import => "",
        FlowDirection::Export => "-OUTGOING",
    };
    format!("E-1R-{}-{}{}", product_code, region.letter(), suffix)
}

/// Paginated response envelope used by every listing endpoint
#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    #[allow(dead_code)]
    count: Option<u64>,
    next: Option<String>,
    results: Vec<T>,
}

/// Wire shape of a unit rate or standing charge entry
#[derive(Debug, Deserialize)]
struct WireEntry {
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
    value_exc_vat: f64,
    value_inc_vat: f64,
}

/// One entry from the products listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Commercial product code (e.g. "AGILE-FLEX-22-11-25")
    pub code: String,

    /// Human product name
    pub display_name: String,

    /// Longer marketing description, when the listing carries one
    #[serde(default)]
    pub description: Option<String>,

    /// "IMPORT" or "EXPORT" on listings that distinguish them
    #[serde(default)]
    pub direction: Option<String>,
}

/// Case-insensitive product search over code and display name
pub fn filter_products(products: Vec<Product>, term: &str) -> Vec<Product> {
    let needle = term.to_lowercase();
    products
        .into_iter()
        .filter(|p| {
            p.display_name.to_lowercase().contains(&needle)
                || p.code.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Octopus-style REST client for tariff rates
pub struct OctopusClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    logger: StructuredLogger,
}

impl OctopusClient {
    /// Create a new client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            logger: get_logger("octopus"),
        })
    }

    /// Follow one listing endpoint across all result pages
    async fn get_pages<T: DeserializeOwned>(&self, mut url: String, label: &str) -> Result<Vec<T>> {
        let mut entries = Vec::new();

        loop {
            self.logger.debug(&format!("GET {}", url));
            let mut req = self.client.get(&url);
            if let Some(key) = &self.api_key {
                // Octopus authenticates with the key as basic-auth username
                req = req.basic_auth(key, None::<&str>);
            }

            let response = req.send().await?;
            if !response.status().is_success() {
                return Err(FaradayError::fetch(format!(
                    "{} returned {}",
                    label,
                    response.status()
                )));
            }

            let page: PagedResponse<T> = response.json().await?;
            entries.extend(page.results);

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(entries)
    }

    /// Fetch one rate endpoint's entries across all result pages
    async fn fetch_paged(&self, request: &FetchRequest, endpoint: &str) -> Result<Vec<WireEntry>> {
        let url = format!(
            "{}/products/{}/electricity-tariffs/{}/{}/?period_from={}&period_to={}",
            self.base_url,
            request.product_code,
            request.tariff_code,
            endpoint,
            request.period_from.format("%Y-%m-%dT%H:%M:%SZ"),
            request.period_to.format("%Y-%m-%dT%H:%M:%SZ"),
        );
        let label = format!("{} for {}", endpoint, request.tariff_code);
        let entries = self.get_pages(url, &label).await?;

        self.logger.info(&format!(
            "Retrieved {} {} entries for {}",
            entries.len(),
            endpoint,
            request.tariff_code
        ));
        Ok(entries)
    }

    /// List every product the supplier currently advertises
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let url = format!("{}/products/", self.base_url);
        let products: Vec<Product> = self.get_pages(url, "products").await?;
        self.logger
            .info(&format!("Retrieved {} products", products.len()));
        Ok(products)
    }

    /// Search advertised products by code or display name
    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>> {
        Ok(filter_products(self.list_products().await?, term))
    }

    fn into_rates(entries: Vec<WireEntry>, rate_type: RateType) -> Vec<Rate> {
        entries
            .into_iter()
            .map(|e| Rate {
                valid_from: e.valid_from,
                valid_to: e.valid_to,
                value_exc_vat: e.value_exc_vat,
                value_inc_vat: e.value_inc_vat,
                rate_type,
            })
            .collect()
    }
}

#[async_trait]
impl RateFetcher for OctopusClient {
    async fn fetch_rates(&self, request: &FetchRequest) -> Result<Vec<Rate>> {
        match request.tariff_type {
            TariffType::Economy7 => {
                // Two registers, two endpoints, tagged on the way in
                let day = self.fetch_paged(request, "day-unit-rates").await?;
                let night = self.fetch_paged(request, "night-unit-rates").await?;

                let mut rates = Self::into_rates(day, RateType::Day);
                rates.extend(Self::into_rates(night, RateType::Night));
                Ok(rates)
            }
            TariffType::Fixed | TariffType::Variable | TariffType::Agile | TariffType::Go => {
                let entries = self.fetch_paged(request, "standard-unit-rates").await?;
                Ok(Self::into_rates(entries, RateType::Standard))
            }
        }
    }

    async fn fetch_standing_charges(&self, request: &FetchRequest) -> Result<Vec<StandingCharge>> {
        let entries = self.fetch_paged(request, "standing-charges").await?;
        Ok(entries
            .into_iter()
            .map(|e| StandingCharge {
                valid_from: e.valid_from,
                valid_to: e.valid_to,
                value_exc_vat: e.value_exc_vat,
                value_inc_vat: e.value_inc_vat,
            })
            .collect())
    }
}
