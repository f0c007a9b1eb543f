//! Episode-number search.
//!
//! Three strategies are tried in the order of [`SEARCH_ORDER`] and the first
//! one that finds the episode wins:
//!
//! - `Api` asks the source directly, when it can search by episode marker.
//! - `Mapping` looks the number up in the cached episode mapping.
//! - `Local` fetches and orders the full catalog again and scans it.
//!
//! A strategy that fails hands over to the next one. The result records which
//! strategy answered.

use crate::cache::EpisodeMappingCache;
use crate::error::{AppError, Result};
use crate::fetch::{FetchSettings, fetch_catalog};
use crate::pagination::{PageSize, PaginationWindow, window};
use crate::source::EpisodeSource;
use crate::types::Episode;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

/// Strategy that produced a search result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Api,
    Mapping,
    Local,
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMethod::Api => "api",
            SearchMethod::Mapping => "mapping",
            SearchMethod::Local => "local",
        };
        write!(f, "{}", name)
    }
}

/// Order in which strategies are attempted.
pub const SEARCH_ORDER: [SearchMethod; 3] =
    [SearchMethod::Api, SearchMethod::Mapping, SearchMethod::Local];

/// A found episode, shown within its page.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SearchOutcome {
    pub episodes: Vec<Episode>,
    pub pagination: PaginationWindow,
    /// Position of the searched episode within `episodes`.
    pub highlighted_index: usize,
    pub searched_episode_number: u32,
    pub search_method: SearchMethod,
}

impl SearchOutcome {
    pub fn episode(&self) -> Option<&Episode> {
        self.episodes.get(self.highlighted_index)
    }
}

enum Attempt {
    Found(SearchOutcome),
    /// Try the next strategy.
    Continue {
        known_total: Option<usize>,
        error: Option<AppError>,
    },
    /// Stop searching with this error.
    Stop(AppError),
}

impl Attempt {
    fn skipped() -> Self {
        Attempt::Continue {
            known_total: None,
            error: None,
        }
    }
}

/// Error for an episode number outside `1..=total_items`.
pub fn out_of_range(number: u32, total_items: usize) -> AppError {
    if total_items == 0 {
        AppError::OutOfRange(format!(
            "Episode #{} not found. The show has no episodes",
            number
        ))
    } else {
        AppError::OutOfRange(format!(
            "Episode #{} not found. Valid range: 1-{}",
            number, total_items
        ))
    }
}

/// Show the page of `episodes` holding episode `number`, highlighted.
fn highlight_in_catalog(
    episodes: &[Episode],
    number: u32,
    page_size: PageSize,
    method: SearchMethod,
) -> Option<SearchOutcome> {
    let position = episodes.iter().position(|e| e.episode_number == number)?;
    let page = match page_size.as_limit() {
        Some(size) => position / size + 1,
        None => 1,
    };

    let found = window(episodes, page, page_size);
    let mut pagination = found.pagination;
    let highlighted_index = position - pagination.offset();
    pagination.is_highlighted = true;
    pagination.searched_episode_number = Some(number);

    Some(SearchOutcome {
        episodes: found.items.to_vec(),
        pagination,
        highlighted_index,
        searched_episode_number: number,
        search_method: method,
    })
}

/// Runs the search strategies against one source and cache.
pub struct EpisodeSearch<'a, S: ?Sized> {
    source: &'a S,
    cache: &'a EpisodeMappingCache,
    settings: &'a FetchSettings,
}

impl<'a, S: EpisodeSource + ?Sized> EpisodeSearch<'a, S> {
    pub fn new(source: &'a S, cache: &'a EpisodeMappingCache, settings: &'a FetchSettings) -> Self {
        Self {
            source,
            cache,
            settings,
        }
    }

    /// Find episode `number` of `show_id`.
    pub async fn run(&self, show_id: &str, number: u32, page_size: PageSize) -> Result<SearchOutcome> {
        let mut known_total = None;
        let mut last_error = None;

        for method in SEARCH_ORDER {
            match self.attempt(method, show_id, number, page_size).await {
                Attempt::Found(outcome) => {
                    info!(
                        "Found episode #{} of show {} via {} search",
                        number, show_id, method
                    );
                    return Ok(outcome);
                }
                Attempt::Continue { known_total: total, error } => {
                    known_total = total.or(known_total);
                    if error.is_some() {
                        last_error = error;
                    }
                }
                Attempt::Stop(err) => return Err(err),
            }
        }

        match (known_total, last_error) {
            (Some(total), _) => Err(out_of_range(number, total)),
            (None, Some(err)) => Err(err),
            (None, None) => Err(AppError::OutOfRange(format!(
                "Episode #{} not found",
                number
            ))),
        }
    }

    async fn attempt(
        &self,
        method: SearchMethod,
        show_id: &str,
        number: u32,
        page_size: PageSize,
    ) -> Attempt {
        match method {
            SearchMethod::Api => self.via_api(show_id, number, page_size).await,
            SearchMethod::Mapping => self.via_mapping(show_id, number, page_size).await,
            SearchMethod::Local => self.via_local(show_id, number, page_size).await,
        }
    }

    async fn via_api(&self, show_id: &str, number: u32, page_size: PageSize) -> Attempt {
        if !self.source.supports_marker_search() {
            return Attempt::skipped();
        }

        match self.source.search_by_episode_marker(show_id, number).await {
            Ok(Some(raw)) => {
                let episode = Episode::from_raw(raw, number);
                let mut pagination = PaginationWindow::compute(1, 1, page_size);
                pagination.is_highlighted = true;
                pagination.searched_episode_number = Some(number);
                Attempt::Found(SearchOutcome {
                    episodes: vec![episode],
                    pagination,
                    highlighted_index: 0,
                    searched_episode_number: number,
                    search_method: SearchMethod::Api,
                })
            }
            Ok(None) => {
                debug!("API search found no episode #{} for show {}", number, show_id);
                Attempt::skipped()
            }
            Err(err) => {
                warn!("API search for episode #{} failed: {}", number, err);
                Attempt::Continue {
                    known_total: None,
                    error: Some(err),
                }
            }
        }
    }

    async fn via_mapping(&self, show_id: &str, number: u32, page_size: PageSize) -> Attempt {
        let mapping = match self
            .cache
            .get_mapping(self.source, show_id, self.settings)
            .await
        {
            Ok(mapping) => mapping,
            Err(err) => {
                warn!("Episode mapping for show {} unavailable: {}", show_id, err);
                return Attempt::Continue {
                    known_total: None,
                    error: Some(err),
                };
            }
        };

        let catalog = mapping.catalog();
        if mapping.get(number).is_some() {
            if let Some(outcome) =
                highlight_in_catalog(&catalog.episodes, number, page_size, SearchMethod::Mapping)
            {
                return Attempt::Found(outcome);
            }
        }

        // A complete catalog has every number, so a local scan cannot do better.
        if catalog.is_complete {
            Attempt::Stop(out_of_range(number, catalog.total_items))
        } else {
            Attempt::Continue {
                known_total: Some(catalog.total_items),
                error: None,
            }
        }
    }

    async fn via_local(&self, show_id: &str, number: u32, page_size: PageSize) -> Attempt {
        match fetch_catalog(self.source, show_id, self.settings).await {
            Ok(catalog) => {
                match highlight_in_catalog(&catalog.episodes, number, page_size, SearchMethod::Local)
                {
                    Some(outcome) => Attempt::Found(outcome),
                    None => Attempt::Continue {
                        known_total: Some(catalog.total_items),
                        error: None,
                    },
                }
            }
            Err(err) => Attempt::Continue {
                known_total: None,
                error: Some(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::order_and_number;
    use crate::types::{ExternalUrls, RawEpisode};

    fn catalog(n: usize) -> Vec<Episode> {
        order_and_number(
            (0..n)
                .map(|i| RawEpisode {
                    id: format!("ep{}", i),
                    name: String::new(),
                    description: String::new(),
                    release_date: None,
                    duration_ms: None,
                    explicit: false,
                    external_urls: ExternalUrls::default(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_out_of_range_message() {
        let msg = out_of_range(150, 100).to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("1-100"));
        assert!(out_of_range(1, 0).to_string().contains("no episodes"));
    }

    #[test]
    fn test_highlight_picks_containing_page() {
        let episodes = catalog(35);
        let outcome =
            highlight_in_catalog(&episodes, 23, PageSize::Limited(10), SearchMethod::Mapping)
                .unwrap();
        assert_eq!(outcome.pagination.current_page, 3);
        assert_eq!(outcome.episodes.len(), 10);
        assert_eq!(outcome.highlighted_index, 2);
        assert_eq!(outcome.episode().map(|e| e.episode_number), Some(23));
        assert!(outcome.pagination.is_highlighted);
        assert_eq!(outcome.pagination.searched_episode_number, Some(23));
    }

    #[test]
    fn test_highlight_unlimited() {
        let episodes = catalog(12);
        let outcome =
            highlight_in_catalog(&episodes, 12, PageSize::Unlimited, SearchMethod::Local).unwrap();
        assert_eq!(outcome.episodes.len(), 12);
        assert_eq!(outcome.highlighted_index, 11);
    }

    #[test]
    fn test_highlight_missing_number() {
        let episodes = catalog(5);
        assert!(
            highlight_in_catalog(&episodes, 6, PageSize::Limited(10), SearchMethod::Mapping)
                .is_none()
        );
        assert!(
            highlight_in_catalog(&episodes, 0, PageSize::Limited(10), SearchMethod::Mapping)
                .is_none()
        );
    }

    #[test]
    fn test_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SearchMethod::Mapping).unwrap(),
            "\"mapping\""
        );
        assert_eq!(SearchMethod::Api.to_string(), "api");
    }
}
