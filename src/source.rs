//! The upstream episode source contract.
//!
//! Everything above this module reads episodes through [`EpisodeSource`], so
//! the HTTP adapter in [`crate::api`] and the in-memory source below are
//! interchangeable.

use crate::error::{AppError, Result};
use crate::types::RawEpisode;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One page of upstream results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourcePage {
    pub items: Vec<RawEpisode>,
    /// Total episodes the show has; stable for one show during one fetch.
    pub total: usize,
}

/// A paginated supplier of raw episodes.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Fetch up to `limit` episodes starting at `offset`.
    async fn get_page(&self, show_id: &str, offset: usize, limit: usize) -> Result<SourcePage>;

    /// Whether [`EpisodeSource::search_by_episode_marker`] does anything useful.
    fn supports_marker_search(&self) -> bool {
        false
    }

    /// Look up the episode titled with marker `number` (for example "#42").
    async fn search_by_episode_marker(
        &self,
        _show_id: &str,
        _number: u32,
    ) -> Result<Option<RawEpisode>> {
        Ok(None)
    }
}

/// Upstream page object, as found in catalog dumps.
#[derive(Debug, Deserialize)]
struct PageDump {
    items: Vec<Option<RawEpisode>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDump {
    Page(PageDump),
    List(Vec<Option<RawEpisode>>),
}

/// Serves a fixed episode list, paged by offset/limit.
///
/// Used for offline browsing of a saved catalog dump.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    episodes: Vec<RawEpisode>,
}

impl InMemorySource {
    pub fn new(episodes: Vec<RawEpisode>) -> Self {
        Self { episodes }
    }

    /// Parse a JSON dump: either an array of episodes or an upstream page object.
    pub fn from_json(content: &str) -> Result<Self> {
        let dump: CatalogDump = serde_json::from_str(content)?;
        let items = match dump {
            CatalogDump::Page(page) => page.items,
            CatalogDump::List(items) => items,
        };
        Ok(Self::new(items.into_iter().flatten().collect()))
    }

    /// Load a JSON dump from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let source = Self::from_json(&content)?;
        debug!(
            "Loaded {} episodes from {}",
            source.episodes.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

#[async_trait]
impl EpisodeSource for InMemorySource {
    async fn get_page(&self, _show_id: &str, offset: usize, limit: usize) -> Result<SourcePage> {
        let start = offset.min(self.episodes.len());
        let end = offset.saturating_add(limit).min(self.episodes.len());
        Ok(SourcePage {
            items: self.episodes[start..end].to_vec(),
            total: self.episodes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episodes(n: usize) -> Vec<RawEpisode> {
        (0..n)
            .map(|i| RawEpisode {
                id: format!("ep{}", i),
                name: format!("Episode {}", i),
                description: String::new(),
                release_date: None,
                duration_ms: None,
                explicit: false,
                external_urls: Default::default(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_in_memory_paging() {
        let source = InMemorySource::new(episodes(7));

        let page = source.get_page("show", 5, 5).await.unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "ep5");

        let past_end = source.get_page("show", 50, 5).await.unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 7);
    }

    #[tokio::test]
    async fn test_marker_search_is_off_by_default() {
        let source = InMemorySource::new(episodes(3));
        assert!(!source.supports_marker_search());
        assert_eq!(source.search_by_episode_marker("show", 1).await.unwrap(), None);
    }

    #[test]
    fn test_from_json_list_drops_nulls() {
        let source =
            InMemorySource::from_json(r#"[{"id": "a"}, null, {"id": "b", "name": "B"}]"#).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_from_json_page_object() {
        let source = InMemorySource::from_json(
            r#"{"items": [{"id": "a", "release_date": "2023-01-01"}], "total": 1, "offset": 0}"#,
        )
        .unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(InMemorySource::from_json("{\"nope\": true}").is_err());
    }
}
