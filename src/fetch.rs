//! Bulk retrieval of a show's full episode list.
//!
//! The first page tells us how many episodes exist; the remaining pages are
//! requested in small concurrent batches with a pause between batches to stay
//! under upstream rate limits. A failed page after the first one is skipped
//! and reported, never fatal.

use crate::error::{AppError, Result};
use crate::ordering::order_and_number;
use crate::source::EpisodeSource;
use crate::types::{EpisodeCatalog, RawEpisode};
use futures::future::join_all;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// Episodes requested per upstream call.
pub const DEFAULT_FETCH_PAGE_SIZE: usize = 50;

/// Upstream calls in flight per batch.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Pause between batches in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;

/// Tuning for [`fetch_all_episodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct FetchSettings {
    pub page_size: usize,
    pub concurrency: usize,
    pub batch_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_FETCH_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

/// Outcome of a single page request.
#[derive(Debug)]
pub enum PageOutcome {
    Fetched {
        page_index: usize,
        items: Vec<RawEpisode>,
    },
    Failed {
        page_index: usize,
        error: AppError,
    },
}

impl PageOutcome {
    pub fn page_index(&self) -> usize {
        match self {
            PageOutcome::Fetched { page_index, .. } | PageOutcome::Failed { page_index, .. } => {
                *page_index
            }
        }
    }
}

/// Raw result of a bulk fetch, in upstream page order.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub episodes: Vec<RawEpisode>,
    pub total_items: usize,
    pub failed_pages: Vec<usize>,
}

impl FetchReport {
    pub fn fetched_items(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_complete(&self) -> bool {
        self.fetched_items() == self.total_items
    }

    /// Order, number and wrap the fetched episodes.
    pub fn into_catalog(self) -> EpisodeCatalog {
        let fetched_items = self.fetched_items();
        let is_complete = self.is_complete();
        EpisodeCatalog {
            episodes: order_and_number(self.episodes),
            total_items: self.total_items,
            fetched_items,
            is_complete,
            failed_pages: self.failed_pages,
        }
    }
}

/// Number of pages needed after the first one.
pub fn additional_pages(total_items: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_items.saturating_sub(page_size).div_ceil(page_size)
}

/// Merge page outcomes by page index, skipping failures.
///
/// Completion order of the outcomes does not matter.
pub fn merge_outcomes(mut outcomes: Vec<PageOutcome>) -> (Vec<RawEpisode>, Vec<usize>) {
    outcomes.sort_by_key(PageOutcome::page_index);

    let mut episodes = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            PageOutcome::Fetched { items, .. } => episodes.extend(items),
            PageOutcome::Failed { page_index, .. } => failed.push(page_index),
        }
    }
    (episodes, failed)
}

async fn fetch_page<S: EpisodeSource + ?Sized>(
    source: &S,
    show_id: &str,
    page_index: usize,
    page_size: usize,
) -> PageOutcome {
    match source.get_page(show_id, page_index * page_size, page_size).await {
        Ok(page) => PageOutcome::Fetched {
            page_index,
            items: page.items,
        },
        Err(error) => PageOutcome::Failed { page_index, error },
    }
}

/// Fetch every page of a show's episodes.
///
/// Fails only when the first page fails.
pub async fn fetch_all_episodes<S: EpisodeSource + ?Sized>(
    source: &S,
    show_id: &str,
    settings: &FetchSettings,
) -> Result<FetchReport> {
    let page_size = settings.page_size.max(1);
    let concurrency = settings.concurrency.max(1);

    let first = source
        .get_page(show_id, 0, page_size)
        .await
        .map_err(|e| AppError::FatalFetch(format!("first page of show {}: {}", show_id, e)))?;

    let total_items = first.total;
    let extra = additional_pages(total_items, page_size);
    debug!(
        "Show {} has {} episodes, fetching {} more pages",
        show_id, total_items, extra
    );

    let mut outcomes = vec![PageOutcome::Fetched {
        page_index: 0,
        items: first.items,
    }];

    let page_indices: Vec<usize> = (1..=extra).collect();
    for (batch_number, batch) in page_indices.chunks(concurrency).enumerate() {
        if batch_number > 0 && !settings.batch_delay.is_zero() {
            sleep(settings.batch_delay).await;
        }

        let results = join_all(
            batch
                .iter()
                .map(|&page_index| fetch_page(source, show_id, page_index, page_size)),
        )
        .await;

        for outcome in &results {
            if let PageOutcome::Failed { page_index, error } = outcome {
                warn!(
                    "Skipping page {} of show {}: {}",
                    page_index + 1,
                    show_id,
                    error
                );
            }
        }
        outcomes.extend(results);
    }

    let (mut episodes, failed_pages) = merge_outcomes(outcomes);
    if episodes.len() > total_items {
        debug!(
            "Show {} returned {} episodes for a total of {}, dropping the excess",
            show_id,
            episodes.len(),
            total_items
        );
        episodes.truncate(total_items);
    }

    let report = FetchReport {
        episodes,
        total_items,
        failed_pages,
    };

    if report.is_complete() {
        info!("Fetched all {} episodes of show {}", total_items, show_id);
    } else {
        info!(
            "Fetched {}/{} episodes of show {} ({} pages failed)",
            report.fetched_items(),
            total_items,
            show_id,
            report.failed_pages.len()
        );
    }

    Ok(report)
}

/// Fetch, order and number a show's full catalog.
pub async fn fetch_catalog<S: EpisodeSource + ?Sized>(
    source: &S,
    show_id: &str,
    settings: &FetchSettings,
) -> Result<EpisodeCatalog> {
    Ok(fetch_all_episodes(source, show_id, settings)
        .await?
        .into_catalog())
}
