//! Release-date filters over an ordered catalog.

use crate::error::{AppError, Result};
use crate::pagination::PaginationWindow;
use crate::types::Episode;
use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Filter kinds accepted on the command line and by the browser.
pub const SUPPORTED_FILTERS: [&str; 4] = ["30days", "90days", "1year", "custom"];

/// Which release-date range to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFilter {
    Last30Days,
    Last90Days,
    LastYear,
    /// Explicit inclusive start and end dates.
    Custom,
}

impl DateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Last30Days => "30days",
            DateFilter::Last90Days => "90days",
            DateFilter::LastYear => "1year",
            DateFilter::Custom => "custom",
        }
    }

    fn lookback_days(&self) -> Option<u64> {
        match self {
            DateFilter::Last30Days => Some(30),
            DateFilter::Last90Days => Some(90),
            DateFilter::LastYear => Some(365),
            DateFilter::Custom => None,
        }
    }

    /// Resolve to concrete dates. Named ranges end at `today`.
    pub fn resolve(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<DateRange> {
        if let Some(days) = self.lookback_days() {
            let start = today.checked_sub_days(Days::new(days)).unwrap_or(today);
            return Ok(DateRange { start, end: today });
        }

        match (start, end) {
            (Some(start), Some(end)) if start <= end => Ok(DateRange { start, end }),
            (Some(start), Some(end)) => Err(AppError::InvalidFilter(format!(
                "Invalid custom date range: start {} is after end {}",
                start, end
            ))),
            _ => Err(AppError::InvalidFilter(
                "Custom date filter requires both a start and an end date".to_string(),
            )),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateFilter {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "30days" => Ok(DateFilter::Last30Days),
            "90days" => Ok(DateFilter::Last90Days),
            "1year" => Ok(DateFilter::LastYear),
            "custom" => Ok(DateFilter::Custom),
            _ => Err(AppError::InvalidFilter(format!(
                "Invalid date filter '{}'. Supported filters: {}",
                s,
                SUPPORTED_FILTERS.join(", ")
            ))),
        }
    }
}

impl Serialize for DateFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Inclusive calendar-date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` date given for a custom filter.
pub fn parse_filter_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::InvalidFilter(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

/// Episodes released within `range`, in catalog order.
///
/// Undated episodes count as released on 1970-01-01.
pub fn filter_episodes(episodes: &[Episode], range: &DateRange) -> Vec<Episode> {
    episodes
        .iter()
        .filter(|e| range.contains(e.sort_date()))
        .cloned()
        .collect()
}

/// A windowed date-filter result.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DateFilterOutcome {
    pub episodes: Vec<Episode>,
    pub pagination: PaginationWindow,
    pub date_filter: DateFilter,
    pub filter_start_date: NaiveDate,
    pub filter_end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExternalUrls, RawEpisode};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn episode(id: &str, release: Option<&str>, number: u32) -> Episode {
        Episode::from_raw(
            RawEpisode {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                release_date: release.map(str::to_string),
                duration_ms: None,
                explicit: false,
                external_urls: ExternalUrls::default(),
            },
            number,
        )
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("30days".parse::<DateFilter>().unwrap(), DateFilter::Last30Days);
        assert_eq!("90DAYS".parse::<DateFilter>().unwrap(), DateFilter::Last90Days);
        assert_eq!("1year".parse::<DateFilter>().unwrap(), DateFilter::LastYear);
        assert_eq!("custom".parse::<DateFilter>().unwrap(), DateFilter::Custom);
    }

    #[test]
    fn test_invalid_kind_names_supported_set() {
        let err = "7days".parse::<DateFilter>().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::InvalidFilter(_)));
        assert!(msg.contains("Invalid date filter"));
        for kind in SUPPORTED_FILTERS {
            assert!(msg.contains(kind));
        }
    }

    #[test]
    fn test_named_ranges_end_today() {
        let today = date("2024-03-31");
        let range = DateFilter::Last30Days.resolve(None, None, today).unwrap();
        assert_eq!(range.start, date("2024-03-01"));
        assert_eq!(range.end, today);

        let year = DateFilter::LastYear.resolve(None, None, today).unwrap();
        assert_eq!(year.start, date("2023-04-01"));
    }

    #[test]
    fn test_custom_range_validation() {
        let today = date("2024-01-01");
        assert!(DateFilter::Custom.resolve(None, Some(today), today).is_err());
        assert!(
            DateFilter::Custom
                .resolve(Some(date("2023-05-02")), Some(date("2023-05-01")), today)
                .is_err()
        );
        let range = DateFilter::Custom
            .resolve(Some(date("2023-05-01")), Some(date("2023-05-01")), today)
            .unwrap();
        assert!(range.contains(date("2023-05-01")));
    }

    #[test]
    fn test_filter_is_inclusive_and_keeps_order() {
        let episodes = vec![
            episode("e1", Some("2023-02-01"), 1),
            episode("e2", Some("2023-01-31"), 2),
            episode("e3", Some("2023-01-15"), 3),
            episode("e4", Some("2023-01-01"), 4),
            episode("e5", Some("2022-12-31"), 5),
            episode("e6", None, 6),
        ];
        let range = DateRange {
            start: date("2023-01-01"),
            end: date("2023-01-31"),
        };
        let ids: Vec<String> = filter_episodes(&episodes, &range)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn test_undated_episodes_match_epoch() {
        let episodes = vec![episode("undated", None, 1)];
        let range = DateRange {
            start: date("1969-12-01"),
            end: date("1970-01-31"),
        };
        assert_eq!(filter_episodes(&episodes, &range).len(), 1);
    }

    #[test]
    fn test_parse_filter_date() {
        assert_eq!(parse_filter_date("2023-01-15").unwrap(), date("2023-01-15"));
        assert!(matches!(
            parse_filter_date("15/01/2023"),
            Err(AppError::InvalidFilter(_))
        ));
    }
}
