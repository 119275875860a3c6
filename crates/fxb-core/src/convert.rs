//! Message-level pipeline: extract → rate-limit → fetch rates → convert.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    domain::{AmountCurrencyPair, CurrencyCode, UserId},
    extract::Extractor,
    rates::{RateCache, RateTable},
    security::RateLimiter,
};

/// One parsed amount with its equivalents in the target currencies.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub base: CurrencyCode,
    pub conversions: BTreeMap<CurrencyCode, f64>,
}

impl Conversion {
    /// Multiply `amount` by every rate of a target currency, skipping the base.
    pub fn compute(
        amount: f64,
        base: CurrencyCode,
        rates: &RateTable,
        targets: &[CurrencyCode],
    ) -> Self {
        let conversions = targets
            .iter()
            .filter(|c| **c != base)
            .filter_map(|c| rates.get(c).map(|rate| (*c, amount * rate)))
            .collect();
        Self {
            amount,
            base,
            conversions,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing that looks like an amount of money.
    NoMatch,
    RateLimited { retry_after_secs: u64 },
    /// At least one pair converted; pairs whose rates failed are left out.
    Converted(Vec<Conversion>),
    /// Every pair failed to get rates.
    RatesUnavailable,
}

pub struct Converter {
    extractor: Arc<Extractor>,
    cache: Arc<RateCache>,
    limiter: Mutex<RateLimiter>,
}

impl Converter {
    pub fn new(extractor: Arc<Extractor>, cache: Arc<RateCache>, limiter: RateLimiter) -> Self {
        Self {
            extractor,
            cache,
            limiter: Mutex::new(limiter),
        }
    }

    pub async fn process(&self, user_id: UserId, text: &str) -> Outcome {
        let pairs = self.extractor.extract(text);
        if pairs.is_empty() {
            tracing::debug!(user_id = user_id.0, "no amount or currency detected");
            return Outcome::NoMatch;
        }

        // Only messages with currency content consume quota.
        {
            let mut limiter = self.limiter.lock().await;
            if !limiter.allow(user_id) {
                let retry_after_secs = limiter.remaining_cooldown_secs(user_id);
                tracing::info!(user_id = user_id.0, retry_after_secs, "rate limited");
                return Outcome::RateLimited { retry_after_secs };
            }
        }

        let conversions = self.convert_pairs(&pairs).await;
        if conversions.is_empty() {
            return Outcome::RatesUnavailable;
        }
        Outcome::Converted(conversions)
    }

    /// Convert each pair independently; a failed lookup only skips its own pair.
    pub async fn convert_pairs(&self, pairs: &[AmountCurrencyPair]) -> Vec<Conversion> {
        let mut out = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let rates = match self.cache.rates(pair.code).await {
                Ok(rates) => rates,
                Err(e) => {
                    tracing::warn!(base = %pair.code, error = %e, "no rates for pair");
                    continue;
                }
            };
            if rates.is_empty() {
                tracing::warn!(base = %pair.code, "rate source returned no rates");
                continue;
            }
            out.push(Conversion::compute(
                pair.amount,
                pair.code,
                &rates,
                self.cache.currencies(),
            ));
        }
        out
    }
}
