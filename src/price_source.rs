use crate::settings::PricingSettings;
use crate::types::Instrument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("No price available for `{0}`")]
    Unavailable(String),

    #[error("Price request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn current_price(&self, instrument: &Instrument) -> Result<Decimal, PriceError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<Decimal>,
}

impl ChartResponse {
    fn last_price(self) -> Option<Decimal> {
        self.chart
            .result?
            .into_iter()
            .next()?
            .meta
            .regular_market_price
    }
}

/// Quotes from a Yahoo-chart-compatible HTTP endpoint.
pub struct YahooPriceSource {
    client: Client,
    base_url: String,
}

impl YahooPriceSource {
    pub fn new(settings: &PricingSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    #[tracing::instrument(skip(self, instrument), fields(symbol = %instrument.symbol))]
    async fn current_price(&self, instrument: &Instrument) -> Result<Decimal, PriceError> {
        let quote_symbol = instrument.quote_symbol();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, quote_symbol);
        trace!(%url, "Requesting price");
        let response: ChartResponse = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let price = response
            .last_price()
            .ok_or(PriceError::Unavailable(quote_symbol))?
            .round_dp(2);
        trace!(%price, "Received price");
        Ok(price)
    }
}
