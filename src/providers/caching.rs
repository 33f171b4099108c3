use crate::core::currency::{RateProvider, RateTable};
use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type SharedRates = Shared<BoxFuture<'static, Result<RateTable, RateError>>>;
type SharedCurrencies = Shared<BoxFuture<'static, Result<BTreeMap<String, String>, RateError>>>;

/// Wraps a [`RateProvider`] so that each `(date, base)` key is fetched at
/// most once per process. Concurrent callers for a key share one pending
/// request. Failed fetches are dropped from the cache once settled so a
/// later call can try again.
pub struct CachingRateProvider<T: RateProvider + 'static> {
    inner: Arc<T>,
    rates: Mutex<HashMap<(NaiveDate, String), SharedRates>>,
    currencies: Mutex<Option<SharedCurrencies>>,
}

impl<T: RateProvider + 'static> CachingRateProvider<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
            rates: Mutex::new(HashMap::new()),
            currencies: Mutex::new(None),
        }
    }

    pub async fn invalidate(&self, date: NaiveDate, base: &str) {
        let mut cache = self.rates.lock().await;
        cache.remove(&(date, base.to_string()));
        debug!("Cache REMOVE for rates: {} {}", base, date);
    }

    pub async fn clear(&self) {
        self.rates.lock().await.clear();
        *self.currencies.lock().await = None;
        debug!("Cache CLEAR");
    }
}

#[async_trait]
impl<T: RateProvider + 'static> RateProvider for CachingRateProvider<T> {
    async fn fetch_rates(&self, date: NaiveDate, base: &str) -> Result<RateTable, RateError> {
        let key = (date, base.to_string());
        let pending = {
            let mut cache = self.rates.lock().await;
            if let Some(shared) = cache.get(&key) {
                debug!("Cache hit for rates: {} {}", base, date);
                shared.clone()
            } else {
                debug!("Cache miss for rates: {} {}", base, date);
                let inner = Arc::clone(&self.inner);
                let owned_base = key.1.clone();
                let shared = async move { inner.fetch_rates(date, &owned_base).await }
                    .boxed()
                    .shared();
                cache.insert(key.clone(), shared.clone());
                shared
            }
        };

        let result = pending.await;
        if result.is_err() {
            let mut cache = self.rates.lock().await;
            let settled_with_error = cache
                .get(&key)
                .and_then(|shared| shared.peek())
                .is_some_and(|settled| settled.is_err());
            if settled_with_error {
                debug!("Evicting failed rates fetch: {} {}", base, date);
                cache.remove(&key);
            }
        }
        result
    }

    async fn fetch_currency_list(&self) -> Result<BTreeMap<String, String>, RateError> {
        let pending = {
            let mut cache = self.currencies.lock().await;
            match cache.as_ref() {
                Some(shared) => {
                    debug!("Cache hit for currency list");
                    shared.clone()
                }
                None => {
                    debug!("Cache miss for currency list");
                    let inner = Arc::clone(&self.inner);
                    let shared = async move { inner.fetch_currency_list().await }
                        .boxed()
                        .shared();
                    *cache = Some(shared.clone());
                    shared
                }
            }
        };

        let result = pending.await;
        if result.is_err() {
            let mut cache = self.currencies.lock().await;
            let settled_with_error = cache
                .as_ref()
                .and_then(|shared| shared.peek())
                .is_some_and(|settled| settled.is_err());
            if settled_with_error {
                *cache = None;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockInnerProvider {
        call_count: Arc<AtomicUsize>,
        failures_left: Arc<AtomicUsize>,
    }

    impl MockInnerProvider {
        fn new(failures: usize) -> (Self, Arc<AtomicUsize>) {
            let call_count = Arc::new(AtomicUsize::new(0));
            let provider = Self {
                call_count: Arc::clone(&call_count),
                failures_left: Arc::new(AtomicUsize::new(failures)),
            };
            (provider, call_count)
        }
    }

    #[async_trait]
    impl RateProvider for MockInnerProvider {
        async fn fetch_rates(&self, date: NaiveDate, base: &str) -> Result<RateTable, RateError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RateError::NetworkUnavailable("offline".to_string()));
            }
            let mut table = RateTable::empty(base, date);
            table.rates.insert("EUR".to_string(), Decimal::new(9, 1));
            Ok(table)
        }

        async fn fetch_currency_list(&self) -> Result<BTreeMap<String, String>, RateError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(BTreeMap::from([("EUR".to_string(), "Euro".to_string())]))
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let (inner, calls) = MockInnerProvider::new(0);
        let provider = CachingRateProvider::new(inner);

        let results = join_all((0..5).map(|_| provider.fetch_rates(date(2), "USD"))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Served from cache afterwards.
        let table = provider.fetch_rates(date(2), "USD").await.unwrap();
        assert_eq!(table.base, "USD");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_date_and_base() {
        let (inner, calls) = MockInnerProvider::new(0);
        let provider = CachingRateProvider::new(inner);

        provider.fetch_rates(date(2), "USD").await.unwrap();
        provider.fetch_rates(date(3), "USD").await.unwrap();
        provider.fetch_rates(date(2), "EUR").await.unwrap();
        provider.fetch_rates(date(2), "USD").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_shared_then_retried() {
        let (inner, calls) = MockInnerProvider::new(1);
        let provider = CachingRateProvider::new(inner);

        let results = join_all((0..3).map(|_| provider.fetch_rates(date(2), "USD"))).await;
        assert!(results.iter().all(|r| {
            matches!(r, Err(RateError::NetworkUnavailable(_)))
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let table = provider.fetch_rates(date(2), "USD").await.unwrap();
        assert_eq!(table.date, date(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let (inner, calls) = MockInnerProvider::new(0);
        let provider = CachingRateProvider::new(inner);

        provider.fetch_rates(date(2), "USD").await.unwrap();
        provider.invalidate(date(2), "USD").await;
        provider.fetch_rates(date(2), "USD").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        provider.fetch_currency_list().await.unwrap();
        provider.fetch_currency_list().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        provider.clear().await;
        provider.fetch_rates(date(2), "USD").await.unwrap();
        provider.fetch_currency_list().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
