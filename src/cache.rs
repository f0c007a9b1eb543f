//! Per-show episode-number lookup tables.
//!
//! A mapping is built from the full catalog the first time a show is asked
//! for and kept until it is cleared. Each show has its own `OnceCell`, so
//! concurrent callers asking for the same show share one build.

use crate::error::Result;
use crate::fetch::{FetchSettings, fetch_catalog};
use crate::source::EpisodeSource;
use crate::types::{Episode, EpisodeCatalog};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Episode number to episode lookup for one show.
#[derive(Debug)]
pub struct EpisodeMapping {
    catalog: EpisodeCatalog,
    by_number: HashMap<u32, usize>,
}

impl EpisodeMapping {
    pub fn from_catalog(catalog: EpisodeCatalog) -> Self {
        let by_number = catalog
            .episodes
            .iter()
            .enumerate()
            .map(|(index, episode)| (episode.episode_number, index))
            .collect();
        Self { catalog, by_number }
    }

    pub fn get(&self, episode_number: u32) -> Option<&Episode> {
        self.by_number
            .get(&episode_number)
            .map(|&index| &self.catalog.episodes[index])
    }

    /// The ordered catalog the mapping was built from.
    pub fn catalog(&self) -> &EpisodeCatalog {
        &self.catalog
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.catalog.episodes
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_api_calls: u64,
    pub cumulative_fetch_time_ms: u64,
}

impl PerformanceStats {
    /// Mean catalog build time, zero before the first build.
    pub fn average_fetch_time_ms(&self) -> f64 {
        if self.total_api_calls == 0 {
            0.0
        } else {
            self.cumulative_fetch_time_ms as f64 / self.total_api_calls as f64
        }
    }
}

type Slot = Arc<OnceCell<Arc<EpisodeMapping>>>;

/// Process-wide store of episode mappings, keyed by show id.
#[derive(Debug, Default)]
pub struct EpisodeMappingCache {
    slots: Mutex<HashMap<String, Slot>>,
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    total_api_calls: AtomicU64,
    cumulative_fetch_time_ms: AtomicU64,
}

impl EpisodeMappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, show_id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(show_id.to_string()).or_default().clone()
    }

    /// Return the mapping for `show_id`, building it on first use.
    ///
    /// A failed build is not cached; the next call tries again.
    pub async fn get_mapping<S: EpisodeSource + ?Sized>(
        &self,
        source: &S,
        show_id: &str,
        settings: &FetchSettings,
    ) -> Result<Arc<EpisodeMapping>> {
        let slot = self.slot(show_id);

        if let Some(mapping) = slot.get() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Episode mapping cache hit for show {}", show_id);
            return Ok(Arc::clone(mapping));
        }

        let built = AtomicBool::new(false);
        let mapping = {
            let built = &built;
            slot.get_or_try_init(move || async move {
                built.store(true, Ordering::Relaxed);
                self.build(source, show_id, settings).await
            })
            .await?
        };

        // Another caller finished the build while we waited.
        if !built.load(Ordering::Relaxed) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }

        Ok(Arc::clone(mapping))
    }

    async fn build<S: EpisodeSource + ?Sized>(
        &self,
        source: &S,
        show_id: &str,
        settings: &FetchSettings,
    ) -> Result<Arc<EpisodeMapping>> {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!("Building episode mapping for show {}", show_id);

        let started = Instant::now();
        let catalog = fetch_catalog(source, show_id, settings).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.total_api_calls.fetch_add(1, Ordering::Relaxed);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.cumulative_fetch_time_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);

        let mapping = EpisodeMapping::from_catalog(catalog);
        if mapping.is_empty() {
            debug!("Show {} has no episodes ({}ms)", show_id, elapsed_ms);
        } else {
            debug!(
                "Mapped {} episodes for show {} in {}ms",
                mapping.len(),
                show_id,
                elapsed_ms
            );
        }
        Ok(Arc::new(mapping))
    }

    /// Forget one show's mapping, or every mapping when `show_id` is `None`.
    pub fn clear(&self, show_id: Option<&str>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match show_id {
            Some(id) => {
                slots.remove(id);
                debug!("Cleared episode mapping for show {}", id);
            }
            None => {
                slots.clear();
                debug!("Cleared all episode mappings");
            }
        }
    }

    /// Whether a finished mapping is cached for `show_id`.
    pub fn contains(&self, show_id: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(show_id).is_some_and(|slot| slot.initialized())
    }

    pub fn stats(&self) -> PerformanceStats {
        PerformanceStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            total_api_calls: self.total_api_calls.load(Ordering::Relaxed),
            cumulative_fetch_time_ms: self.cumulative_fetch_time_ms.load(Ordering::Relaxed),
        }
    }
}
