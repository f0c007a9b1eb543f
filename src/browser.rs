//! Entry point used by the CLI: catalog fetches, windows, search and filters
//! for one episode source.

use crate::cache::{EpisodeMappingCache, PerformanceStats};
use crate::error::{AppError, Failure, Result};
use crate::fetch::{FetchSettings, fetch_catalog};
use crate::filter::{DateFilter, DateFilterOutcome, filter_episodes};
use crate::ordering::number_page;
use crate::pagination::{PageSize, PaginationWindow, window};
use crate::search::{EpisodeSearch, SearchOutcome};
use crate::source::EpisodeSource;
use crate::types::{EpisodeCatalog, EpisodeWindow};
use chrono::{Local, NaiveDate};
use log::debug;

/// Browses the episode catalogs served by `S`.
///
/// Owns its own [`EpisodeMappingCache`]; two browsers never share mappings
/// or statistics.
pub struct EpisodeBrowser<S> {
    source: S,
    cache: EpisodeMappingCache,
    settings: FetchSettings,
}

impl<S: EpisodeSource> EpisodeBrowser<S> {
    pub fn new(source: S) -> Self {
        Self::with_settings(source, FetchSettings::default())
    }

    pub fn with_settings(source: S, settings: FetchSettings) -> Self {
        Self {
            source,
            cache: EpisodeMappingCache::new(),
            settings,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the full, ordered catalog. Always goes upstream.
    pub async fn get_all_episodes(&self, show_id: &str) -> Result<EpisodeCatalog> {
        fetch_catalog(&self.source, show_id, &self.settings).await
    }

    /// One page of the full catalog, built through the mapping cache.
    pub async fn get_episodes_window(
        &self,
        show_id: &str,
        page: usize,
        page_size: PageSize,
    ) -> Result<EpisodeWindow> {
        let mapping = self
            .cache
            .get_mapping(&self.source, show_id, &self.settings)
            .await?;
        let found = window(mapping.episodes(), page, page_size);
        Ok(EpisodeWindow {
            episodes: found.items.to_vec(),
            pagination: found.pagination,
        })
    }

    /// One page fetched with a single upstream request.
    ///
    /// Numbers are derived from the page offset. Page sizes the upstream
    /// cannot serve in one request go through [`Self::get_episodes_window`].
    pub async fn get_episodes_page(
        &self,
        show_id: &str,
        page: usize,
        page_size: PageSize,
    ) -> Result<EpisodeWindow> {
        let size = match page_size.as_limit() {
            Some(size) if size <= self.settings.page_size => size,
            _ => return self.get_episodes_window(show_id, page, page_size).await,
        };

        let requested = page.max(1);
        let mut result = self
            .source
            .get_page(show_id, (requested - 1) * size, size)
            .await?;
        let pagination = PaginationWindow::compute(result.total, requested, page_size);

        if pagination.current_page != requested && result.total > 0 {
            debug!(
                "Page {} of show {} is out of range, loading page {}",
                requested, show_id, pagination.current_page
            );
            result = self
                .source
                .get_page(show_id, pagination.offset(), size)
                .await?;
        }

        let mut items = result.items;
        items.truncate(size);
        Ok(EpisodeWindow {
            episodes: number_page(items, pagination.current_page, size),
            pagination,
        })
    }

    /// Find episode `number`, shown within its page.
    pub async fn search_episode_by_number(
        &self,
        show_id: &str,
        number: u32,
        page_size: PageSize,
    ) -> std::result::Result<SearchOutcome, Failure> {
        EpisodeSearch::new(&self.source, &self.cache, &self.settings)
            .run(show_id, number, page_size)
            .await
            .map_err(Failure::from)
    }

    /// Episodes released within a date range, windowed.
    ///
    /// `kind` is one of `30days`, `90days`, `1year` or `custom`; `custom`
    /// needs both `start` and `end`.
    pub async fn filter_episodes_by_date(
        &self,
        show_id: &str,
        kind: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        page: usize,
        page_size: PageSize,
    ) -> std::result::Result<DateFilterOutcome, Failure> {
        let today = Local::now().date_naive();
        self.filter_on(show_id, kind, start, end, page, page_size, today)
            .await
            .map_err(Failure::from)
    }

    /// [`Self::filter_episodes_by_date`] with an explicit "today".
    #[allow(clippy::too_many_arguments)]
    pub async fn filter_on(
        &self,
        show_id: &str,
        kind: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        page: usize,
        page_size: PageSize,
        today: NaiveDate,
    ) -> Result<DateFilterOutcome> {
        let filter: DateFilter = kind.parse()?;
        let range = filter.resolve(start, end, today)?;

        let mapping = self
            .cache
            .get_mapping(&self.source, show_id, &self.settings)
            .await?;
        let matching = filter_episodes(mapping.episodes(), &range);
        debug!(
            "{} of {} episodes of show {} fall between {} and {}",
            matching.len(),
            mapping.len(),
            show_id,
            range.start,
            range.end
        );

        let found = window(&matching, page, page_size);
        Ok(DateFilterOutcome {
            episodes: found.items.to_vec(),
            pagination: found.pagination,
            date_filter: filter,
            filter_start_date: range.start,
            filter_end_date: range.end,
        })
    }

    pub fn get_performance_stats(&self) -> PerformanceStats {
        self.cache.stats()
    }

    /// Drop one show's cached mapping, or all of them.
    pub fn clear_episode_mapping(&self, show_id: Option<&str>) {
        self.cache.clear(show_id);
    }
}

impl<S> std::fmt::Debug for EpisodeBrowser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeBrowser")
            .field("settings", &self.settings)
            .field("stats", &self.cache.stats())
            .finish()
    }
}

/// Validate an episode number typed by the user.
pub fn parse_episode_number(value: &str) -> Result<u32> {
    match value.trim().trim_start_matches('#').parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::InvalidInput(format!(
            "'{}' is not a valid episode number",
            value
        ))),
    }
}
