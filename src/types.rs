//! Type definitions for the podcast-catalog library.
//!
//! This module contains the upstream episode payload, the numbered episodes
//! built from it, and the catalog/window containers handed to callers.

use crate::pagination::PaginationWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Links to the episode on external services.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// Raw episode data as returned by the upstream API.
///
/// Converted into [`Episode`] once the catalog is ordered and numbered.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RawEpisode {
    /// Unique identifier for the episode.
    pub id: String,

    /// Episode title.
    #[serde(default)]
    pub name: String,

    /// Plain-text description.
    #[serde(default)]
    pub description: String,

    /// Release date with year, month or day precision (`2023`, `2023-01`, `2023-01-15`).
    #[serde(default)]
    pub release_date: Option<String>,

    /// Length in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,

    #[serde(default)]
    pub explicit: bool,

    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Parse an upstream release date.
///
/// Month and year precision dates resolve to the first day of the period.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use podcast_catalog::types::parse_release_date;
///
/// assert_eq!(parse_release_date("2023-01-15"), NaiveDate::from_ymd_opt(2023, 1, 15));
/// assert_eq!(parse_release_date("2023-04"), NaiveDate::from_ymd_opt(2023, 4, 1));
/// assert_eq!(parse_release_date("2021"), NaiveDate::from_ymd_opt(2021, 1, 1));
/// assert_eq!(parse_release_date("soon"), None);
/// ```
pub fn parse_release_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    match value.len() {
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok(),
        4 if value.chars().all(|c| c.is_ascii_digit()) => {
            value.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        }
        _ => None,
    }
}

/// The date used for episodes without a usable release date.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Format a millisecond duration as `H:MM:SS` or `M:SS`.
///
/// # Examples
///
/// ```
/// use podcast_catalog::types::format_duration;
///
/// assert_eq!(format_duration(Some(2_712_000)), "45:12");
/// assert_eq!(format_duration(Some(3_905_000)), "1:05:05");
/// assert_eq!(format_duration(None), "Unknown");
/// ```
pub fn format_duration(duration_ms: Option<u64>) -> String {
    let Some(ms) = duration_ms else {
        return "Unknown".to_string();
    };

    let secs = ms / 1000;
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// A numbered episode of a show.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `None` when upstream sent no date or one that could not be parsed.
    pub release_date: Option<NaiveDate>,
    pub duration_ms: Option<u64>,
    pub explicit: bool,
    pub external_url: Option<String>,
    /// Position in the full catalog, newest episode first, starting at 1.
    pub episode_number: u32,
}

impl Episode {
    /// Build a numbered episode from its upstream representation.
    pub fn from_raw(raw: RawEpisode, episode_number: u32) -> Self {
        let release_date = raw.release_date.as_deref().and_then(parse_release_date);
        Self {
            id: raw.id,
            title: raw.name,
            description: raw.description,
            release_date,
            duration_ms: raw.duration_ms,
            explicit: raw.explicit,
            external_url: raw.external_urls.spotify,
            episode_number,
        }
    }

    /// Date used for ordering and date filters.
    pub fn sort_date(&self) -> NaiveDate {
        self.release_date.unwrap_or_else(earliest_date)
    }

    /// Description cut to at most `max_chars` characters, with an ellipsis when cut.
    ///
    /// # Examples
    ///
    /// ```
    /// use podcast_catalog::types::{Episode, RawEpisode, ExternalUrls};
    ///
    /// let raw = RawEpisode {
    ///     id: "ep1".to_string(),
    ///     name: "Pilot".to_string(),
    ///     description: "A very long description".to_string(),
    ///     release_date: None,
    ///     duration_ms: None,
    ///     explicit: false,
    ///     external_urls: ExternalUrls::default(),
    /// };
    /// let ep = Episode::from_raw(raw, 1);
    /// assert_eq!(ep.truncated_description(6), "A very...");
    /// assert_eq!(ep.truncated_description(100), "A very long description");
    /// ```
    pub fn truncated_description(&self, max_chars: usize) -> String {
        if self.description.chars().count() <= max_chars {
            return self.description.clone();
        }
        let cut: String = self.description.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }

    /// Format the episode for a one-line listing.
    pub fn to_display(&self) -> String {
        let date = self
            .release_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown date".to_string());
        let explicit = if self.explicit { " [E]" } else { "" };
        format!(
            "#{} {}{} ({}, {})",
            self.episode_number,
            self.title,
            explicit,
            date,
            format_duration(self.duration_ms)
        )
    }
}

/// The full, ordered set of episodes for one show.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EpisodeCatalog {
    /// Newest first.
    pub episodes: Vec<Episode>,
    /// Count reported by the source.
    pub total_items: usize,
    /// Count actually retrieved.
    pub fetched_items: usize,
    pub is_complete: bool,
    /// Indices of upstream pages that failed and were skipped.
    pub failed_pages: Vec<usize>,
}

/// One screen worth of episodes.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EpisodeWindow {
    pub episodes: Vec<Episode>,
    pub pagination: PaginationWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, date: Option<&str>) -> RawEpisode {
        RawEpisode {
            id: id.to_string(),
            name: format!("Title {}", id),
            description: String::new(),
            release_date: date.map(str::to_string),
            duration_ms: Some(61_000),
            explicit: false,
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/episode/{}", id)),
            },
        }
    }

    #[test]
    fn test_parse_release_date_rejects_garbage() {
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("2023-13-01"), None);
        assert_eq!(parse_release_date("abcd"), None);
    }

    #[test]
    fn test_episode_from_raw() {
        let ep = Episode::from_raw(raw("ep1", Some("2023-01-15")), 3);
        assert_eq!(ep.episode_number, 3);
        assert_eq!(ep.title, "Title ep1");
        assert_eq!(ep.release_date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(
            ep.external_url.as_deref(),
            Some("https://open.spotify.com/episode/ep1")
        );
    }

    #[test]
    fn test_missing_date_sorts_as_epoch() {
        let ep = Episode::from_raw(raw("ep1", Some("not a date")), 1);
        assert!(ep.release_date.is_none());
        assert_eq!(ep.sort_date(), earliest_date());
    }

    #[test]
    fn test_episode_to_display() {
        let ep = Episode::from_raw(raw("ep1", Some("2023-01-15")), 1);
        assert_eq!(ep.to_display(), "#1 Title ep1 (2023-01-15, 1:01)");
    }

    #[test]
    fn test_episode_to_display_unknowns() {
        let mut r = raw("ep2", None);
        r.duration_ms = None;
        r.explicit = true;
        let ep = Episode::from_raw(r, 7);
        assert_eq!(ep.to_display(), "#7 Title ep2 [E] (Unknown date, Unknown)");
    }

    #[test]
    fn test_truncated_description_multibyte() {
        let mut r = raw("ep3", None);
        r.description = "héllo wörld".to_string();
        let ep = Episode::from_raw(r, 1);
        assert_eq!(ep.truncated_description(5), "héllo...");
    }

    #[test]
    fn test_raw_episode_deserializes_sparse_object() {
        let raw: RawEpisode = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(raw.id, "x");
        assert!(raw.release_date.is_none());
        assert!(raw.duration_ms.is_none());
        assert!(!raw.explicit);
    }
}
