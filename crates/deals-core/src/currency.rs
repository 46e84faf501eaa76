//! Currency Exchange Service
//!
//! Fetches the national-bank rate table once per calendar day, caches it in
//! memory and converts prices between the base currency and the rest of the
//! table. Rates are expressed as BYN per one unit of the foreign currency.
//!
//! Cache lifecycle: `EMPTY -> LOADED(rates, expires_on)`. Expiry is lazy -
//! the table is discarded on the first call at or after the expiry date and
//! refetched. The cache lock is held across the fetch, so concurrent misses
//! share a single in-flight request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::model::{ExchangeRates, Price, BYN};
use crate::search::ApiResponse;

/// Exchange-rate provider client (e.g. the national bank API).
#[async_trait]
pub trait RateClient: Send + Sync {
    /// Fetch the rate table published for `date`.
    async fn rates_on(&self, date: NaiveDate) -> Result<ApiResponse>;
}

/// Builds an [`ExchangeRates`] table from a provider-specific payload.
///
/// Returns `None` when the payload carries no usable rates; that is treated
/// the same as a failed fetch, not as an error.
pub trait RateResultFactory: Send + Sync {
    fn build(&self, payload: &Value) -> Option<ExchangeRates>;
}

/// Source of "today" for cache expiry. Injectable so tests can move the day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation of [`Clock`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Default)]
struct RateCache {
    rates: Option<ExchangeRates>,
    expires_on: Option<NaiveDate>,
}

/// Daily exchange-rate cache and price converter.
pub struct CurrencyExchangeService {
    client: Arc<dyn RateClient>,
    factory: Arc<dyn RateResultFactory>,
    clock: Arc<dyn Clock>,
    cache: Mutex<RateCache>,
}

impl CurrencyExchangeService {
    pub fn new(client: Arc<dyn RateClient>, factory: Arc<dyn RateResultFactory>) -> Self {
        Self::with_clock(client, factory, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<dyn RateClient>,
        factory: Arc<dyn RateResultFactory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            factory,
            clock,
            cache: Mutex::new(RateCache::default()),
        }
    }

    /// Current rate table, fetching it if the cache is empty or expired.
    ///
    /// Asks the provider for *yesterday's* table: today's rate may not have
    /// been published yet. A transport failure surfaces as `None`, never as
    /// an error, and leaves the cache empty so the next caller retries.
    pub async fn get_rates(&self) -> Option<ExchangeRates> {
        let today = self.clock.today();
        let mut cache = self.cache.lock().await;
        if cache.expires_on.is_some_and(|expires| expires <= today) {
            cache.rates = None;
            cache.expires_on = None;
        }
        if cache.rates.is_none() {
            let yesterday = today - Duration::days(1);
            let response = match self.client.rates_on(yesterday).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(%err, "exchange rate fetch failed");
                    return None;
                }
            };
            let Some(rates) = self.factory.build(&response.payload) else {
                tracing::warn!("exchange rate payload contained no usable rates");
                return None;
            };
            cache.rates = Some(rates);
            cache.expires_on = Some(today + Duration::days(1));
        }
        cache.rates.clone()
    }

    /// Convert `price` into `target` currency.
    ///
    /// Returns `None` when the currencies are equal, rates are unavailable or
    /// the needed code is missing from the table - the caller keeps the
    /// native price, which is not an error.
    ///
    /// Rates are published against the base currency only, so conversions out
    /// of a foreign currency are keyed by that currency's own rate, and
    /// foreign-to-foreign conversions must chain through BYN (two calls).
    /// Rounding is midpoint-away-from-zero to whole minor units.
    pub async fn convert(&self, price: &Price, target: &str) -> Option<Price> {
        if price.currency == target {
            return None;
        }
        let rates = self.get_rates().await?;
        let amount = if price.currency == BYN {
            let rate = rates.get(target)?;
            if rate.is_zero() {
                return None;
            }
            Decimal::from(price.amount) / *rate
        } else if target == BYN {
            let rate = rates.get(price.currency.as_str())?;
            Decimal::from(price.amount) * *rate
        } else {
            return None;
        };
        let amount = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Some(Price::new(amount.to_i64()?, target))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::model::{RUB, USD};

    struct ScriptedRateClient {
        fetches: AtomicUsize,
        requested_dates: StdMutex<Vec<NaiveDate>>,
        fail: bool,
        delay_ms: u64,
    }

    impl ScriptedRateClient {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                requested_dates: StdMutex::new(vec![]),
                fail: false,
                delay_ms: 0,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn slow(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Self::new()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateClient for ScriptedRateClient {
        async fn rates_on(&self, date: NaiveDate) -> Result<ApiResponse> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.requested_dates.lock().unwrap().push(date);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(crate::SearchError::Transport("connection refused".into()));
            }
            Ok(ApiResponse {
                payload: json!({"table": "static"}),
                status: 200,
            })
        }
    }

    struct StaticRateFactory;

    impl RateResultFactory for StaticRateFactory {
        fn build(&self, _payload: &Value) -> Option<ExchangeRates> {
            let mut rates = ExchangeRates::new();
            rates.insert(USD.into(), dec!(2.5));
            // BYN per one RUB
            rates.insert(RUB.into(), dec!(0.034));
            Some(rates)
        }
    }

    struct ManualClock(StdMutex<NaiveDate>);

    impl ManualClock {
        fn at(date: NaiveDate) -> Self {
            Self(StdMutex::new(date))
        }

        fn advance_days(&self, days: i64) {
            let mut today = self.0.lock().unwrap();
            *today = *today + Duration::days(days);
        }
    }

    impl Clock for ManualClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(
        client: Arc<ScriptedRateClient>,
        clock: Arc<ManualClock>,
    ) -> CurrencyExchangeService {
        CurrencyExchangeService::with_clock(client, Arc::new(StaticRateFactory), clock)
    }

    #[tokio::test]
    async fn same_day_calls_share_one_fetch() {
        let client = Arc::new(ScriptedRateClient::new());
        let svc = service(client.clone(), Arc::new(ManualClock::at(date(2022, 3, 10))));

        let first = svc.get_rates().await.unwrap();
        let second = svc.get_rates().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn requests_yesterdays_table() {
        let client = Arc::new(ScriptedRateClient::new());
        let svc = service(client.clone(), Arc::new(ManualClock::at(date(2022, 3, 10))));

        svc.get_rates().await.unwrap();

        let dates = client.requested_dates.lock().unwrap();
        assert_eq!(dates.as_slice(), [date(2022, 3, 9)]);
    }

    #[tokio::test]
    async fn expiry_triggers_exactly_one_refetch() {
        let client = Arc::new(ScriptedRateClient::new());
        let clock = Arc::new(ManualClock::at(date(2022, 3, 10)));
        let svc = service(client.clone(), clock.clone());

        svc.get_rates().await.unwrap();
        clock.advance_days(1);
        svc.get_rates().await.unwrap();
        svc.get_rates().await.unwrap();

        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_single_flight() {
        let client = Arc::new(ScriptedRateClient::slow(20));
        let clock = Arc::new(ManualClock::at(date(2022, 3, 10)));
        let svc = Arc::new(service(client.clone(), clock));

        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.get_rates().await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.get_rates().await }
        });

        assert!(a.await.unwrap().is_some());
        assert!(b.await.unwrap().is_some());
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_yields_no_rates_and_retries_later() {
        let client = Arc::new(ScriptedRateClient::failing());
        let svc = service(client.clone(), Arc::new(ManualClock::at(date(2022, 3, 10))));

        assert!(svc.get_rates().await.is_none());
        assert!(svc.get_rates().await.is_none());
        // failure is not cached: every caller retries
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn converts_base_to_display_currency() {
        let svc = service(
            Arc::new(ScriptedRateClient::new()),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        let converted = svc.convert(&Price::byn(500), USD).await.unwrap();
        assert_eq!(converted, Price::new(200, USD));
    }

    #[tokio::test]
    async fn converts_foreign_currency_into_base() {
        let svc = service(
            Arc::new(ScriptedRateClient::new()),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        // 10000 RUB kopecks * 0.034 BYN/RUB = 340 BYN kopecks
        let converted = svc.convert(&Price::new(10_000, RUB), BYN).await.unwrap();
        assert_eq!(converted, Price::new(340, BYN));
    }

    #[tokio::test]
    async fn rounds_midpoint_away_from_zero() {
        let svc = service(
            Arc::new(ScriptedRateClient::new()),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        // 101 / 2.5 = 40.4 -> 40; 102 / 2.5 = 40.8 -> 41
        assert_eq!(svc.convert(&Price::byn(101), USD).await.unwrap().amount, 40);
        assert_eq!(svc.convert(&Price::byn(102), USD).await.unwrap().amount, 41);
        // exact midpoint: 250 * 0.034 = 8.5 -> 9
        assert_eq!(svc.convert(&Price::new(250, RUB), BYN).await.unwrap().amount, 9);
    }

    #[tokio::test]
    async fn conversion_round_trips_within_rounding_tolerance() {
        let svc = service(
            Arc::new(ScriptedRateClient::new()),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        let original = Price::byn(497);
        let usd = svc.convert(&original, USD).await.unwrap();
        let back = svc.convert(&usd, BYN).await.unwrap();
        assert!((back.amount - original.amount).abs() <= 2);
    }

    #[tokio::test]
    async fn degenerate_conversions_return_none() {
        let svc = service(
            Arc::new(ScriptedRateClient::new()),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        // same currency
        assert!(svc.convert(&Price::byn(100), BYN).await.is_none());
        // target missing from the table
        assert!(svc.convert(&Price::byn(100), "EUR").await.is_none());
        // foreign to foreign must chain through the base currency
        assert!(svc.convert(&Price::new(100, RUB), USD).await.is_none());
    }

    #[tokio::test]
    async fn conversion_degrades_when_rates_unavailable() {
        let svc = CurrencyExchangeService::with_clock(
            Arc::new(ScriptedRateClient::failing()),
            Arc::new(StaticRateFactory),
            Arc::new(ManualClock::at(date(2022, 3, 10))),
        );

        assert!(svc.convert(&Price::byn(100), USD).await.is_none());
    }
}
