use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::config::ElementsConfig;
use crate::elements::{Clock, OrbitalElements, Provider, SatelliteTarget, SourceError, Transport};

/// Outcome of the most recent provider loop, live or fallback.
struct Attempt {
    elements: OrbitalElements,
    finished_at: DateTime<Utc>,
    generation: u64,
}

impl Attempt {
    fn is_live(&self) -> bool {
        !self.elements.is_fallback()
    }
}

/// Supplies current elements for one satellite with caching and provider failover.
///
/// The cache lock is held for the whole provider loop. Callers that queued
/// behind a running loop take its outcome, even the fallback snapshot,
/// instead of issuing their own requests. Only live elements are served to
/// later callers from the TTL cache.
pub struct ElementSource<T, C> {
    transport: T,
    clock: C,
    providers: Vec<Provider>,
    target: SatelliteTarget,
    cache_ttl: chrono::Duration,
    fetch_timeout: std::time::Duration,
    cache: Mutex<Option<Attempt>>,
    generation: AtomicU64,
}

impl<T: Transport, C: Clock> ElementSource<T, C> {
    pub fn new(transport: T, clock: C, config: &ElementsConfig) -> Self {
        Self {
            transport,
            clock,
            providers: config.providers.clone(),
            target: config.target.clone(),
            cache_ttl: chrono::Duration::from_std(config.cache_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
            fetch_timeout: config.fetch_timeout,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Never fails: when every provider is down the bundled snapshot is returned.
    pub async fn get_elements(&self) -> OrbitalElements {
        let seen = self.generation.load(Ordering::SeqCst);
        let mut cache = self.cache.lock().await;

        if let Some(attempt) = cache.as_ref() {
            if attempt.generation != seen {
                log::debug!(
                    "Sharing elements fetched while waiting for {}",
                    attempt.elements.name
                );
                return attempt.elements.clone();
            }
            if attempt.is_live() && self.clock.now() - attempt.finished_at < self.cache_ttl {
                log::debug!("Using cached elements for {}", attempt.elements.name);
                return attempt.elements.clone();
            }
        }

        let elements = self.fetch_from_providers().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *cache = Some(Attempt {
            elements: elements.clone(),
            finished_at: self.clock.now(),
            generation,
        });
        elements
    }

    async fn fetch_from_providers(&self) -> OrbitalElements {
        for (i, provider) in self.providers.iter().enumerate() {
            log::info!(
                "Fetching elements from provider {}/{}: {}",
                i + 1,
                self.providers.len(),
                provider.name
            );
            match self.try_provider(provider).await {
                Ok(elements) => {
                    log::info!("Got elements for {} from {}", elements.name, provider.name);
                    return elements;
                }
                Err(e) => {
                    log::warn!("Provider {} failed: {}", provider.name, e);
                }
            }
        }

        log::warn!(
            "All {} element providers failed, using stale fallback snapshot",
            self.providers.len()
        );
        OrbitalElements::fallback()
    }

    /// Drops the cached elements so the next call refetches.
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    async fn try_provider(&self, provider: &Provider) -> Result<OrbitalElements, SourceError> {
        let body = tokio::time::timeout(self.fetch_timeout, self.transport.fetch(&provider.url))
            .await
            .map_err(|_| SourceError::Timeout(self.fetch_timeout))??;
        provider.parse(&body, &self.target)
    }
}
