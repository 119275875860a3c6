//! currencyapi.com adapter for the rate-source port.
//!
//! `GET {api_url}?apikey=..&base_currency=USD&currencies=EUR,RUB` answers
//! `{"data": {"EUR": {"code": "EUR", "value": 0.92}, ...}}`.

use std::time::Duration;

use async_trait::async_trait;

use fxb_core::{
    domain::CurrencyCode,
    errors::Error,
    rates::{RateSource, RateTable},
    Result,
};

#[derive(Clone, Debug)]
pub struct CurrencyApiClient {
    pub api_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl CurrencyApiClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("reqwest client build: {e}")))?;
        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    /// `GET {api_url}?apikey=..&base_currency=..&currencies=..` with the base left out.
    pub fn request(&self, base: CurrencyCode, targets: &[CurrencyCode]) -> Result<reqwest::Request> {
        let currencies = targets
            .iter()
            .filter(|c| **c != base)
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");

        self.http
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("base_currency", base.as_str()),
                ("currencies", currencies.as_str()),
            ])
            .build()
            .map_err(|e| Error::External(format!("currencyapi request build: {e}")))
    }
}

#[async_trait]
impl RateSource for CurrencyApiClient {
    fn name(&self) -> &str {
        "currencyapi"
    }

    async fn fetch(&self, base: CurrencyCode, targets: &[CurrencyCode]) -> Result<RateTable> {
        let unavailable = |reason: String| Error::RateSourceUnavailable { base, reason };

        let req = self.request(base, targets).map_err(|e| unavailable(e.to_string()))?;
        let resp = self
            .http
            .execute(req)
            .await
            .map_err(|e| unavailable(format!("currencyapi request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(unavailable(format!(
                "currencyapi returned {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| unavailable(format!("currencyapi json error: {e}")))?;

        parse_rates(&v).map_err(|e| unavailable(e.to_string()))
    }
}

/// Extract `data.<CODE>.value`; codes outside the supported set are skipped.
pub fn parse_rates(v: &serde_json::Value) -> Result<RateTable> {
    let data = v
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| Error::External("currencyapi response has no `data` object".to_string()))?;

    let mut table = RateTable::new();
    for (code, info) in data {
        let Ok(code) = code.parse::<CurrencyCode>() else {
            tracing::debug!(%code, "skipping unsupported currency in response");
            continue;
        };
        let Some(value) = info.get("value").and_then(|x| x.as_f64()) else {
            return Err(Error::External(format!(
                "currencyapi response has no numeric value for {code}"
            )));
        };
        table.insert(code, value);
    }
    Ok(table)
}
