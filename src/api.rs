//! HTTP episode source for a Spotify-style Web API.
//!
//! This module pages through `/shows/{id}/episodes` and, when enabled,
//! searches `/search` for an episode whose title carries a given number.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::source::{EpisodeSource, SourcePage};
use crate::types::RawEpisode;
use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::sleep;

/// Maximum number of retry attempts for failed requests.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds (doubles each retry).
const BASE_RETRY_DELAY_MS: u64 = 500;

/// Largest `limit` the upstream accepts.
pub const MAX_PAGE_LIMIT: usize = 50;

const USER_AGENT: &str = concat!("podcast-catalog/", env!("CARGO_PKG_VERSION"));

// "#12", "Episode 12", "Ep. 12", "ep12", "E12"
static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:#\s*|\bepisode\s*|\bep\.?\s*|\be)(\d+)\b").expect("valid marker regex")
});

/// Episode numbers written in a title.
///
/// # Examples
///
/// ```
/// use podcast_catalog::api::episode_markers;
///
/// assert_eq!(episode_markers("Episode 12: The Return"), vec![12]);
/// assert_eq!(episode_markers("#7 - Ep. 8"), vec![7, 8]);
/// assert!(episode_markers("Season finale").is_empty());
/// ```
pub fn episode_markers(title: &str) -> Vec<u32> {
    EPISODE_MARKER
        .captures_iter(title)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Whether `title` is marked as episode `number`.
pub fn title_has_marker(title: &str, number: u32) -> bool {
    episode_markers(title).contains(&number)
}

/// Check if an error is retryable (network errors, timeouts, rate limits, server errors).
fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error
            .status()
            .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
            .unwrap_or(false)
}

/// Convert a final request failure into an application error.
fn classify_error(operation_name: &str, error: reqwest::Error) -> AppError {
    match error.status() {
        Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
            AppError::Auth(format!("{} was rejected: {}", operation_name, error))
        }
        _ => AppError::Network(format!("{} failed: {}", operation_name, error)),
    }
}

/// Retry an async operation with exponential backoff.
///
/// Retries the operation up to `MAX_RETRIES` times on retryable errors,
/// with exponential backoff starting at `BASE_RETRY_DELAY_MS`.
async fn retry_with_backoff<T, F, Fut>(operation_name: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        "{} succeeded after {} attempts",
                        operation_name,
                        attempt + 1
                    );
                }
                return Ok(result);
            }
            Err(e) if attempt < MAX_RETRIES && is_retryable_error(&e) => {
                let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * 2_u64.pow(attempt));
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name,
                    attempt + 1,
                    MAX_RETRIES + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(classify_error(operation_name, e)),
        }
    }
}

// Response types for show episodes
#[derive(Debug, Deserialize)]
struct EpisodesPage {
    #[serde(default)]
    items: Vec<Option<RawEpisode>>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ShowSummary {
    name: String,
}

// Response types for search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    episodes: SearchEpisodes,
}

#[derive(Debug, Deserialize)]
struct SearchEpisodes {
    #[serde(default)]
    items: Vec<Option<RawEpisode>>,
}

/// Episode source backed by the upstream Web API.
#[derive(Debug, Clone)]
pub struct HttpEpisodeSource {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    market: Option<String>,
    marker_search: bool,
}

impl HttpEpisodeSource {
    /// Build a source from the user's configuration.
    ///
    /// Fails when no access token is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_token(config, config.resolve_access_token())
    }

    fn with_token(config: &Config, access_token: Option<String>) -> Result<Self> {
        let access_token = access_token.ok_or_else(|| {
            AppError::Auth(format!(
                "No access token configured. Set access_token in {} or the {} environment variable",
                Config::get_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string()),
                crate::config::TOKEN_ENV_VAR
            ))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token,
            market: config.market.clone(),
            marker_search: config.api_search,
        })
    }

    fn market_query(&self) -> Vec<(&'static str, String)> {
        self.market
            .iter()
            .map(|m| ("market", m.clone()))
            .collect()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation_name: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = retry_with_backoff(operation_name, || {
            let request = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .query(query);
            async move { request.send().await.and_then(|r| r.error_for_status()) }
        })
        .await?;

        resp.json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse {}: {}", operation_name, e)))
    }

    async fn show_name(&self, show_id: &str) -> Result<String> {
        let url = format!("{}/shows/{}", self.api_base, show_id);
        let show: ShowSummary = self
            .get_json(&format!("Fetch show {}", show_id), &url, &self.market_query())
            .await?;
        Ok(show.name)
    }
}

#[async_trait]
impl EpisodeSource for HttpEpisodeSource {
    async fn get_page(&self, show_id: &str, offset: usize, limit: usize) -> Result<SourcePage> {
        debug!(
            "Fetching episodes {}..{} of show {}",
            offset,
            offset + limit,
            show_id
        );

        let url = format!("{}/shows/{}/episodes", self.api_base, show_id);
        let mut query = vec![
            ("offset", offset.to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
        ];
        query.extend(self.market_query());

        let page: EpisodesPage = self
            .get_json(
                &format!("Fetch episodes at offset {}", offset),
                &url,
                &query,
            )
            .await?;

        Ok(SourcePage {
            items: page.items.into_iter().flatten().collect(),
            total: page.total,
        })
    }

    fn supports_marker_search(&self) -> bool {
        self.marker_search
    }

    async fn search_by_episode_marker(
        &self,
        show_id: &str,
        number: u32,
    ) -> Result<Option<RawEpisode>> {
        if !self.marker_search {
            return Ok(None);
        }

        let name = self.show_name(show_id).await?;
        let url = format!("{}/search", self.api_base);
        let mut query = vec![
            ("q", format!("{} {}", name, number)),
            ("type", "episode".to_string()),
            ("limit", "20".to_string()),
        ];
        query.extend(self.market_query());

        let found: SearchResponse = self
            .get_json(&format!("Search for episode #{}", number), &url, &query)
            .await?;

        let hit = found
            .episodes
            .items
            .into_iter()
            .flatten()
            .find(|e| title_has_marker(&e.name, number));

        debug!(
            "Search for '{} {}' {}",
            name,
            number,
            if hit.is_some() { "matched" } else { "found nothing" }
        );
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_common_formats() {
        assert_eq!(episode_markers("#42: Guest Interview"), vec![42]);
        assert_eq!(episode_markers("Episode 42 - Guest"), vec![42]);
        assert_eq!(episode_markers("EPISODE42"), vec![42]);
        assert_eq!(episode_markers("Ep. 42"), vec![42]);
        assert_eq!(episode_markers("ep 42"), vec![42]);
        assert_eq!(episode_markers("E42 The Guest"), vec![42]);
        assert_eq!(episode_markers("# 042"), vec![42]);
    }

    #[test]
    fn test_markers_ignore_plain_numbers() {
        assert!(episode_markers("Top 10 moments of 2023").is_empty());
        assert!(episode_markers("The 42 rules").is_empty());
    }

    #[test]
    fn test_title_has_marker() {
        assert!(title_has_marker("Ep. 7 - Lucky", 7));
        assert!(!title_has_marker("Ep. 70 - Lucky", 7));
        assert!(!title_has_marker("Ep. 7a", 7));
    }

    #[test]
    fn test_missing_token_is_auth_error() {
        let config = Config::new();
        let token = config.resolve_access_token_from(None);
        let err = HttpEpisodeSource::with_token(&config, token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert!(err.to_string().contains(crate::config::TOKEN_ENV_VAR));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            api_base: "http://localhost:9999/v1/".to_string(),
            access_token: Some("token".to_string()),
            market: Some("GB".to_string()),
            api_search: true,
            ..Config::new()
        };
        let source = HttpEpisodeSource::from_config(&config).unwrap();
        assert_eq!(source.api_base, "http://localhost:9999/v1");
        assert!(source.supports_marker_search());
        assert_eq!(source.market_query(), vec![("market", "GB".to_string())]);
    }

    #[test]
    fn test_page_deserializes_with_null_items() {
        let page: EpisodesPage = serde_json::from_str(
            r#"{"items": [{"id": "a"}, null], "total": 2, "limit": 50, "offset": 0}"#,
        )
        .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.into_iter().flatten().count(), 1);
    }
}
