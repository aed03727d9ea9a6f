use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::{
    Config, WeatherCache, WeatherError, WeatherPayload, WeatherProvider, WeatherSnapshot,
    format::format_last_updated, provider::providers_from_config,
};

/// Serves current weather from the cache or the first provider that answers.
///
/// Degrade order: fresh cache, each provider in turn, stale cache of any age,
/// then the last provider error.
#[derive(Debug)]
pub struct WeatherAggregator {
    providers: Vec<Box<dyn WeatherProvider>>,
    cache: Arc<WeatherCache>,
    freshness: Duration,
}

impl WeatherAggregator {
    pub fn new(
        providers: Vec<Box<dyn WeatherProvider>>,
        cache: Arc<WeatherCache>,
        freshness: Duration,
    ) -> Self {
        Self { providers, cache, freshness }
    }

    /// Standard provider chain with an empty cache.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            providers_from_config(config)?,
            Arc::new(WeatherCache::new()),
            config.freshness_window(),
        ))
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }

    pub async fn current_weather(&self) -> Result<WeatherPayload, WeatherError> {
        self.current_weather_at(Utc::now()).await
    }

    pub async fn current_weather_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<WeatherPayload, WeatherError> {
        let mut slot = self.cache.lock().await;

        if let Some(entry) = slot.fresh(now, self.freshness) {
            debug!(stored_at = %entry.stored_at, "serving fresh cached weather");
            let snapshot = WeatherSnapshot {
                last_updated: format_last_updated(entry.stored_at),
                ..entry.snapshot.clone()
            };
            return Ok(WeatherPayload::cached(snapshot));
        }

        let refreshed = AssertUnwindSafe(self.fetch_from_providers(now))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(WeatherError::Unexpected(panic_message(panic))));

        match refreshed {
            Ok(snapshot) => {
                slot.replace(snapshot.clone(), now);
                Ok(WeatherPayload::fresh(snapshot))
            }
            Err(err) => match slot.entry() {
                Some(entry) => {
                    warn!(error = %err, stored_at = %entry.stored_at, "returning stale cached weather");
                    Ok(WeatherPayload::cached(entry.snapshot.clone()))
                }
                None => {
                    error!(error = %err, "no weather data available");
                    Err(err)
                }
            },
        }
    }

    /// Try each provider in order and stop at the first success.
    async fn fetch_from_providers(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.current(now).await {
                Ok(snapshot) => {
                    info!(provider = %provider.id(), "weather data fetched");
                    return Ok(snapshot);
                }
                Err(err) => {
                    warn!(provider = %provider.id(), error = %err, "weather provider failed");
                    last_error = Some(err);
                }
            }
        }

        error!("all weather providers failed");
        Err(last_error.unwrap_or_else(|| WeatherError::configuration("No weather providers configured")))
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "provider panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    enum Behavior {
        Succeed(&'static str),
        Fail(&'static str),
        Panic,
    }

    #[derive(Debug)]
    struct StubProvider {
        id: ProviderId,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        fn boxed(id: ProviderId, behavior: Behavior) -> (Box<dyn WeatherProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let stub = StubProvider { id, behavior, calls: calls.clone() };
            (Box::new(stub), calls)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn current(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed(temp) => Ok(WeatherSnapshot {
                    temperature: temp.to_string(),
                    condition: format!("from {}", self.id),
                    feels_like: None,
                    humidity: Some("70%".into()),
                    wind_speed: Some("10 km/h".into()),
                    location: Some("Guayaquil".into()),
                    last_updated: format_last_updated(now),
                }),
                Behavior::Fail(msg) => Err(WeatherError::transport(msg)),
                Behavior::Panic => panic!("stub exploded"),
            }
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 20, 0, 0).unwrap()
    }

    fn aggregator(providers: Vec<Box<dyn WeatherProvider>>) -> WeatherAggregator {
        WeatherAggregator::new(providers, Arc::new(WeatherCache::new()), Duration::minutes(15))
    }

    #[tokio::test]
    async fn first_success_wins_and_stops_chain() {
        let (p1, c1) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Succeed("28°C"));
        let (p2, c2) = StubProvider::boxed(ProviderId::Wttr, Behavior::Succeed("27°C"));
        let agg = aggregator(vec![p1, p2]);

        let payload = agg.current_weather_at(t0()).await.unwrap();

        assert!(!payload.cached);
        assert_eq!(payload.snapshot.temperature, "28°C");
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);
        assert_eq!(agg.cache().peek().await.map(|e| e.stored_at), Some(t0()));
    }

    #[tokio::test]
    async fn falls_back_in_order() {
        let (p1, c1) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Fail("no key"));
        let (p2, c2) = StubProvider::boxed(ProviderId::Wttr, Behavior::Fail("down"));
        let (p3, c3) = StubProvider::boxed(ProviderId::WttrBasic, Behavior::Succeed("26°C"));
        let agg = aggregator(vec![p1, p2, p3]);

        let payload = agg.current_weather_at(t0()).await.unwrap();

        assert!(!payload.cached);
        assert_eq!(payload.snapshot.condition, "from wttr-basic");
        assert_eq!(
            [c1.load(Ordering::SeqCst), c2.load(Ordering::SeqCst), c3.load(Ordering::SeqCst)],
            [1, 1, 1]
        );
    }

    #[tokio::test]
    async fn fresh_cache_skips_providers() {
        let (p1, c1) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Succeed("28°C"));
        let agg = aggregator(vec![p1]);

        let first = agg.current_weather_at(t0()).await.unwrap();
        let second = agg.current_weather_at(t0() + Duration::minutes(14)).await.unwrap();

        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert!(second.cached);
        assert_eq!(second.snapshot, first.snapshot);
    }

    #[tokio::test]
    async fn fresh_cache_recomputes_last_updated_from_store_time() {
        let cache = Arc::new(WeatherCache::new());
        let mut stale_label = WeatherSnapshot {
            temperature: "28°C".into(),
            condition: "Sunny".into(),
            feels_like: None,
            humidity: None,
            wind_speed: None,
            location: None,
            last_updated: "provider label".into(),
        };
        cache.lock().await.replace(stale_label.clone(), t0());
        let agg = WeatherAggregator::new(Vec::new(), cache, Duration::minutes(15));

        let payload = agg.current_weather_at(t0() + Duration::minutes(1)).await.unwrap();

        stale_label.last_updated = format_last_updated(t0());
        assert_eq!(payload, WeatherPayload::cached(stale_label));
    }

    #[tokio::test]
    async fn expired_cache_triggers_refresh() {
        let (p1, c1) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Succeed("28°C"));
        let agg = aggregator(vec![p1]);

        agg.current_weather_at(t0()).await.unwrap();
        let payload = agg.current_weather_at(t0() + Duration::minutes(15)).await.unwrap();

        assert!(!payload.cached);
        assert_eq!(c1.load(Ordering::SeqCst), 2);
        assert_eq!(
            agg.cache().peek().await.map(|e| e.stored_at),
            Some(t0() + Duration::minutes(15))
        );
    }

    #[tokio::test]
    async fn total_failure_serves_stale_cache_of_any_age() {
        let (p1, _) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Fail("down"));
        let cache = Arc::new(WeatherCache::new());
        let stored = WeatherSnapshot {
            temperature: "25°C".into(),
            condition: "Rain".into(),
            feels_like: None,
            humidity: Some("90%".into()),
            wind_speed: Some("5 km/h".into()),
            location: Some("Guayaquil".into()),
            last_updated: "original label".into(),
        };
        cache.lock().await.replace(stored.clone(), t0());
        let agg = WeatherAggregator::new(vec![p1], cache, Duration::minutes(15));

        let payload = agg.current_weather_at(t0() + Duration::days(30)).await.unwrap();

        assert_eq!(payload, WeatherPayload::cached(stored));
        assert_eq!(agg.cache().peek().await.map(|e| e.stored_at), Some(t0()));
    }

    #[tokio::test]
    async fn total_failure_without_cache_returns_last_error() {
        let (p1, _) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Fail("first"));
        let (p2, _) = StubProvider::boxed(ProviderId::Wttr, Behavior::Fail("second"));
        let (p3, _) = StubProvider::boxed(ProviderId::WttrBasic, Behavior::Fail("third"));
        let agg = aggregator(vec![p1, p2, p3]);

        let err = agg.current_weather_at(t0()).await.unwrap_err();

        assert_eq!(err.to_string(), "transport error: third");
        assert!(agg.cache().peek().await.is_none());
    }

    #[tokio::test]
    async fn no_providers_is_configuration_error() {
        let agg = aggregator(Vec::new());

        let err = agg.current_weather_at(t0()).await.unwrap_err();
        assert!(matches!(err, WeatherError::Configuration(_)));
    }

    #[tokio::test]
    async fn panicking_provider_falls_back_to_stale_cache() {
        let (p1, _) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Panic);
        let cache = Arc::new(WeatherCache::new());
        let agg = WeatherAggregator::new(vec![p1], cache.clone(), Duration::minutes(15));

        let err = agg.current_weather_at(t0()).await.unwrap_err();
        assert_eq!(err.to_string(), "unexpected error: stub exploded");

        let (ok, _) = StubProvider::boxed(ProviderId::Wttr, Behavior::Succeed("27°C"));
        WeatherAggregator::new(vec![ok], cache.clone(), Duration::minutes(15))
            .current_weather_at(t0())
            .await
            .unwrap();

        let payload = agg.current_weather_at(t0() + Duration::hours(1)).await.unwrap();
        assert!(payload.cached);
        assert_eq!(payload.snapshot.temperature, "27°C");
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_refresh() {
        let (p1, c1) = StubProvider::boxed(ProviderId::OpenWeather, Behavior::Succeed("28°C"));
        let agg = Arc::new(aggregator(vec![p1]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let agg = agg.clone();
                tokio::spawn(async move { agg.current_weather_at(t0()).await })
            })
            .collect();

        let mut fresh = 0;
        for handle in handles {
            if !handle.await.unwrap().unwrap().cached {
                fresh += 1;
            }
        }

        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(fresh, 1);
    }
}
