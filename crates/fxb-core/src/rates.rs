//! Exchange-rate cache with a global TTL and on-disk persistence.
//!
//! Freshness is tracked with one timestamp for the whole cache (the time of
//! the last successful fetch, whatever its base). A base is served from cache
//! only while that timestamp is within TTL and the base has been fetched
//! before. Every successful fetch rewrites the cache file so a restart keeps
//! using the last known rates until they expire.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::CurrencyCode, errors::Error, Result};

/// Rates relative to one unit of a base currency.
pub type RateTable = BTreeMap<CurrencyCode, f64>;

/// Port for a remote exchange-rate provider.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch rates of `targets` against one unit of `base`.
    async fn fetch(&self, base: CurrencyCode, targets: &[CurrencyCode]) -> Result<RateTable>;
}

#[derive(Clone, Debug)]
pub struct RateCacheConfig {
    pub ttl: Duration,
    /// Currencies requested from the source (the base is always left out).
    pub currencies: Vec<CurrencyCode>,
    /// Where the cache is persisted; `None` keeps it in memory only.
    pub cache_file: Option<PathBuf>,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            currencies: CurrencyCode::ALL.to_vec(),
            cache_file: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct CacheState {
    fetched_at: Option<DateTime<Utc>>,
    rates: BTreeMap<CurrencyCode, RateTable>,
}

/// On-disk layout: `{"timestamp": ISO-8601, "rates": {BASE: {CODE: rate}}}`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    timestamp: String,
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

pub struct RateCache {
    source: Arc<dyn RateSource>,
    cfg: RateCacheConfig,
    state: Mutex<CacheState>,
    persist_lock: Mutex<()>,
}

impl RateCache {
    /// Empty cache; nothing is read from disk.
    pub fn new(source: Arc<dyn RateSource>, cfg: RateCacheConfig) -> Self {
        Self::with_state(source, cfg, CacheState::default())
    }

    /// Cache primed from `cfg.cache_file`. A missing or unreadable file is a cold start.
    pub fn load(source: Arc<dyn RateSource>, cfg: RateCacheConfig) -> Self {
        let state = match cfg.cache_file.as_deref() {
            None => CacheState::default(),
            Some(path) => match read_cache_file(path) {
                Ok(Some(state)) => {
                    tracing::info!(
                        path = %path.display(),
                        bases = state.rates.len(),
                        "loaded rate cache"
                    );
                    state
                }
                Ok(None) => CacheState::default(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "rate cache unreadable, starting cold");
                    CacheState::default()
                }
            },
        };
        Self::with_state(source, cfg, state)
    }

    fn with_state(source: Arc<dyn RateSource>, cfg: RateCacheConfig, state: CacheState) -> Self {
        Self {
            source,
            cfg,
            state: Mutex::new(state),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.cfg.currencies
    }

    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.fetched_at
    }

    pub async fn cached_rates(&self, base: CurrencyCode) -> Option<RateTable> {
        self.state.lock().await.rates.get(&base).cloned()
    }

    pub async fn rates(&self, base: CurrencyCode) -> Result<RateTable> {
        self.rates_at(base, Utc::now()).await
    }

    /// Rates for `base` as seen at `now`; fetches when the cache cannot serve them.
    pub async fn rates_at(&self, base: CurrencyCode, now: DateTime<Utc>) -> Result<RateTable> {
        {
            let state = self.state.lock().await;
            if self.is_fresh(&state, now) {
                if let Some(table) = state.rates.get(&base) {
                    tracing::debug!(%base, "rate cache hit");
                    return Ok(table.clone());
                }
            }
        }

        let targets: Vec<CurrencyCode> = self
            .cfg
            .currencies
            .iter()
            .copied()
            .filter(|c| *c != base)
            .collect();

        // No lock is held across the network call.
        let table = self
            .source
            .fetch(base, &targets)
            .await
            .map_err(|e| match e {
                Error::RateSourceUnavailable { .. } => e,
                other => Error::RateSourceUnavailable {
                    base,
                    reason: other.to_string(),
                },
            })?;

        tracing::info!(
            source = self.source.name(),
            %base,
            rates = table.len(),
            "fetched exchange rates"
        );

        {
            let mut state = self.state.lock().await;
            state.rates.insert(base, table.clone());
            // A slow fetch finishing late must not move the shared stamp backwards.
            state.fetched_at = state.fetched_at.max(Some(now));
        }
        self.persist().await;

        Ok(table)
    }

    fn is_fresh(&self, state: &CacheState, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.cfg.ttl).unwrap_or(TimeDelta::MAX);
        state
            .fetched_at
            .is_some_and(|at| now.signed_duration_since(at) < ttl)
    }

    async fn persist(&self) {
        let Some(path) = self.cfg.cache_file.as_deref() else {
            return;
        };

        // Snapshot under the persist lock so the last writer always writes the newest state.
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.lock().await.clone();
        if let Err(e) = write_cache_file(path, &snapshot).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist rate cache");
        }
    }
}

fn read_cache_file(path: &Path) -> Result<Option<CacheState>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = std::fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let file: CacheFile = serde_json::from_str(&txt)?;

    let fetched_at = parse_timestamp(&file.timestamp)
        .ok_or_else(|| Error::External(format!("invalid cache timestamp: {}", file.timestamp)))?;

    let mut rates = BTreeMap::new();
    for (base, table) in file.rates {
        let Ok(base) = base.parse::<CurrencyCode>() else {
            continue;
        };
        let table: RateTable = table
            .into_iter()
            .filter_map(|(code, rate)| code.parse::<CurrencyCode>().ok().map(|c| (c, rate)))
            .collect();
        rates.insert(base, table);
    }

    Ok(Some(CacheState {
        fetched_at: Some(fetched_at),
        rates,
    }))
}

async fn write_cache_file(path: &Path, state: &CacheState) -> Result<()> {
    let file = CacheFile {
        timestamp: state.fetched_at.unwrap_or_else(Utc::now).to_rfc3339(),
        rates: state
            .rates
            .iter()
            .map(|(base, table)| {
                let table = table
                    .iter()
                    .map(|(code, rate)| (code.to_string(), *rate))
                    .collect();
                (base.to_string(), table)
            })
            .collect(),
    };
    let txt = serde_json::to_string(&file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Write-then-rename so readers never observe a half-written file.
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Accepts RFC 3339 and the offset-less ISO form (`2024-05-01T10:00:00.123456`), read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use CurrencyCode::*;

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        fail: AtomicBool,
        requested: std::sync::Mutex<Vec<(CurrencyCode, Vec<CurrencyCode>)>>,
    }

    impl FakeSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self, base: CurrencyCode, targets: &[CurrencyCode]) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested
                .lock()
                .unwrap()
                .push((base, targets.to_vec()));
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::External("connection refused".to_string()));
            }
            Ok(targets
                .iter()
                .enumerate()
                .map(|(i, c)| (*c, 1.0 + i as f64))
                .collect())
        }
    }

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
    }

    fn cfg(ttl_secs: u64, cache_file: Option<PathBuf>) -> RateCacheConfig {
        RateCacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            currencies: vec![Usd, Eur, Rub],
            cache_file,
        }
    }

    #[tokio::test]
    async fn second_request_within_ttl_is_served_from_cache() {
        let source = Arc::new(FakeSource::default());
        let cache = RateCache::new(source.clone(), cfg(60, None));
        let t0 = Utc::now();

        let first = cache.rates_at(Usd, t0).await.unwrap();
        let second = cache
            .rates_at(Usd, t0 + TimeDelta::seconds(30))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_cache_refetches_exactly_once() {
        let source = Arc::new(FakeSource::default());
        let cache = RateCache::new(source.clone(), cfg(60, None));
        let t0 = Utc::now();

        cache.rates_at(Usd, t0).await.unwrap();
        let later = t0 + TimeDelta::seconds(61);
        cache.rates_at(Usd, later).await.unwrap();
        cache.rates_at(Usd, later).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn base_is_excluded_from_request() {
        let source = Arc::new(FakeSource::default());
        let cache = RateCache::new(source.clone(), cfg(60, None));

        let table = cache.rates(Eur).await.unwrap();

        assert!(!table.contains_key(&Eur));
        let requested = source.requested.lock().unwrap().clone();
        assert_eq!(requested, vec![(Eur, vec![Usd, Rub])]);
    }

    #[tokio::test]
    async fn new_base_fetches_and_refreshes_global_timestamp() {
        let source = Arc::new(FakeSource::default());
        let cache = RateCache::new(source.clone(), cfg(60, None));
        let t0 = Utc::now();

        cache.rates_at(Usd, t0).await.unwrap();
        let t1 = t0 + TimeDelta::seconds(50);
        cache.rates_at(Eur, t1).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.fetched_at().await, Some(t1));

        // USD is still served: the shared timestamp was refreshed by the EUR fetch.
        cache
            .rates_at(Usd, t0 + TimeDelta::seconds(100))
            .await
            .unwrap();
        assert_eq!(source.calls(), 2);
    }

    /// Holds USD fetches until released; other bases answer immediately.
    #[derive(Default)]
    struct GatedSource {
        started: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl RateSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch(&self, base: CurrencyCode, targets: &[CurrencyCode]) -> Result<RateTable> {
            if base == Usd {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(targets.iter().map(|c| (*c, 2.0)).collect())
        }
    }

    #[tokio::test]
    async fn late_slow_fetch_keeps_newer_timestamp() {
        let source = Arc::new(GatedSource::default());
        let cache = Arc::new(RateCache::new(source.clone(), cfg(60, None)));
        let t0 = Utc::now();
        let t1 = t0 + TimeDelta::seconds(10);

        let slow = tokio::spawn({
            let cache = cache.clone();
            async move { cache.rates_at(Usd, t0).await }
        });
        source.started.notified().await;

        cache.rates_at(Rub, t1).await.unwrap();
        assert_eq!(cache.fetched_at().await, Some(t1));

        source.release.notify_one();
        slow.await.unwrap().unwrap();

        assert_eq!(cache.fetched_at().await, Some(t1));
        assert!(cache.cached_rates(Usd).await.is_some());
    }

    #[tokio::test]
    async fn source_failure_is_rate_source_unavailable() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let cache = RateCache::new(source.clone(), cfg(60, None));

        let err = cache.rates(Rub).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RateSourceUnavailable { base: Rub, .. }
        ));
        assert!(cache.cached_rates(Rub).await.is_none());
        assert!(cache.fetched_at().await.is_none());
    }

    #[tokio::test]
    async fn persisted_cache_round_trips() {
        let dir = tmp("fxb-cache");
        let path = dir.join("rates_cache.json");

        let source = Arc::new(FakeSource::default());
        let cache = RateCache::new(source.clone(), cfg(3600, Some(path.clone())));
        let t0 = Utc::now();
        cache.rates_at(Usd, t0).await.unwrap();
        cache.rates_at(Eur, t0).await.unwrap();

        let reloaded = RateCache::load(source.clone(), cfg(3600, Some(path.clone())));
        assert_eq!(reloaded.cached_rates(Usd).await, cache.cached_rates(Usd).await);
        assert_eq!(reloaded.cached_rates(Eur).await, cache.cached_rates(Eur).await);
        let stamp = reloaded.fetched_at().await.unwrap();
        assert!(stamp >= t0);

        // Fresh reloaded data is served without another fetch.
        reloaded.rates_at(Usd, t0).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert!(!dir.join("rates_cache.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_cache_file_is_a_cold_start() {
        let dir = tmp("fxb-corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rates_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let source = Arc::new(FakeSource::default());
        let cache = RateCache::load(source.clone(), cfg(3600, Some(path.clone())));
        assert!(cache.fetched_at().await.is_none());

        cache.rates(Usd).await.unwrap();
        assert_eq!(source.calls(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_naive_iso_timestamps_and_skips_unknown_codes() {
        let dir = tmp("fxb-naive");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rates_cache.json");
        std::fs::write(
            &path,
            r#"{"timestamp": "2024-05-01T10:00:00.123456", "rates": {"USD": {"EUR": 0.92, "XAU": 0.0004}, "ZZZ": {"USD": 1.0}}}"#,
        )
        .unwrap();

        let state = read_cache_file(&path).unwrap().unwrap();
        assert_eq!(
            state.fetched_at.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00.123456+00:00"
        );
        assert_eq!(state.rates.len(), 1);
        assert_eq!(state.rates[&Usd], RateTable::from([(Eur, 0.92)]));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
