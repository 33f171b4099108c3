use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::currency::{RateProvider, RateTable};
use crate::core::error::RateError;

/// Historical rates from a Frankfurter-compatible API.
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, retries: usize, retry_delay_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("snapfolio/1.0")
            .build()?;
        Ok(FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries,
            retry_delay_ms,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RateError> {
        with_retry(
            || self.client.get(url).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|e| RateError::NetworkUnavailable(format!("Request error: {e} for URL: {url}")))
    }
}

/// Rates are read from the JSON number text, never through a float.
#[derive(Debug, Deserialize)]
struct Rate(#[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    date: NaiveDate,
    rates: HashMap<String, Rate>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(
        name = "FrankfurterRatesFetch",
        skip(self),
        fields(date = %date, base = %base)
    )]
    async fn fetch_rates(&self, date: NaiveDate, base: &str) -> Result<RateTable, RateError> {
        let url = format!("{}/{}?base={}", self.base_url, date.format("%Y-%m-%d"), base);
        debug!("Requesting rates from {}", url);

        let response = self.get(&url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RateError::NotFound {
                date,
                base: base.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RateError::InvalidResponse(format!(
                "HTTP error: {status} for rates of {base} on {date}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::NetworkUnavailable(e.to_string()))?;
        let data: RatesResponse = serde_json::from_str(&text).map_err(|e| {
            RateError::InvalidResponse(format!(
                "Failed to parse JSON response for {base} on {date}: {e}"
            ))
        })?;

        let mut rates: HashMap<String, Decimal> = data
            .rates
            .into_iter()
            .map(|(code, Rate(rate))| (code, rate))
            .collect();
        rates.entry(data.base.clone()).or_insert(Decimal::ONE);

        debug!(count = rates.len(), served_date = %data.date, "Received rates");
        Ok(RateTable {
            base: data.base,
            date: data.date,
            rates,
        })
    }

    async fn fetch_currency_list(&self) -> Result<BTreeMap<String, String>, RateError> {
        let url = format!("{}/currencies", self.base_url);
        debug!("Requesting currency list from {}", url);

        let response = self.get(&url).await?;
        if !response.status().is_success() {
            return Err(RateError::InvalidResponse(format!(
                "HTTP error: {} for currency list",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::NetworkUnavailable(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            RateError::InvalidResponse(format!("Failed to parse currency list: {e}"))
        })
    }
}
