//! Reverse-chronological ordering and episode numbering.

use crate::types::{Episode, RawEpisode};

/// Sort newest first and number from 1.
///
/// Episodes without a usable date sort as 1970-01-01. The sort is stable, so
/// episodes sharing a date keep the order the source returned them in.
pub fn order_and_number(raw: Vec<RawEpisode>) -> Vec<Episode> {
    number_from(raw, 0)
}

/// Order and number a single upstream page.
///
/// Numbers continue from the page offset, `(page - 1) * page_size + index + 1`,
/// so they match what the full catalog would assign when upstream pages
/// are already newest first.
pub fn number_page(raw: Vec<RawEpisode>, page: usize, page_size: usize) -> Vec<Episode> {
    number_from(raw, page.saturating_sub(1) * page_size)
}

fn number_from(raw: Vec<RawEpisode>, offset: usize) -> Vec<Episode> {
    let mut episodes: Vec<Episode> = raw
        .into_iter()
        .map(|r| Episode::from_raw(r, 0))
        .collect();

    episodes.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));

    for (index, episode) in episodes.iter_mut().enumerate() {
        episode.episode_number = (offset + index + 1) as u32;
    }
    episodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExternalUrls;

    fn raw(id: &str, date: Option<&str>) -> RawEpisode {
        RawEpisode {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            release_date: date.map(str::to_string),
            duration_ms: None,
            explicit: false,
            external_urls: ExternalUrls::default(),
        }
    }

    fn ids(episodes: &[Episode]) -> Vec<&str> {
        episodes.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_newest_first_and_numbered() {
        let episodes = order_and_number(vec![
            raw("ep1", Some("2023-01-01")),
            raw("ep2", Some("2023-01-15")),
            raw("ep3", Some("2023-01-08")),
        ]);

        assert_eq!(ids(&episodes), vec!["ep2", "ep3", "ep1"]);
        let numbers: Vec<u32> = episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_and_invalid_dates_go_last() {
        let episodes = order_and_number(vec![
            raw("nodate", None),
            raw("old", Some("2001-05-05")),
            raw("bad", Some("yesterday")),
            raw("new", Some("2024-02-02")),
        ]);
        assert_eq!(ids(&episodes), vec!["new", "old", "nodate", "bad"]);
    }

    #[test]
    fn test_epoch_dated_episode_ties_with_missing_date() {
        let episodes = order_and_number(vec![
            raw("nodate", None),
            raw("epoch", Some("1970-01-01")),
            raw("recent", Some("2020-01-01")),
        ]);
        // Equal sort keys: source order wins.
        assert_eq!(ids(&episodes), vec!["recent", "nodate", "epoch"]);
    }

    #[test]
    fn test_ties_keep_source_order() {
        let episodes = order_and_number(vec![
            raw("a", Some("2023-03-03")),
            raw("b", Some("2023-03-03")),
            raw("c", Some("2023-03")),
            raw("d", Some("2023-03-03")),
        ]);
        assert_eq!(ids(&episodes), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_dates_never_increase() {
        let dates = [
            "2022-06-01", "2021", "2023-01-31", "2022-06", "2023-01-30", "2020-12-12",
        ];
        let raw_episodes = dates
            .iter()
            .enumerate()
            .map(|(i, d)| raw(&format!("ep{}", i), Some(*d)))
            .collect();
        let episodes = order_and_number(raw_episodes);
        for pair in episodes.windows(2) {
            assert!(pair[0].sort_date() >= pair[1].sort_date());
        }
        assert_eq!(episodes[0].episode_number, 1);
        assert_eq!(episodes.last().map(|e| e.episode_number), Some(6));
    }

    #[test]
    fn test_number_page_uses_offset() {
        let episodes = number_page(
            vec![raw("x", Some("2022-01-01")), raw("y", Some("2022-02-01"))],
            3,
            10,
        );
        assert_eq!(ids(&episodes), vec!["y", "x"]);
        assert_eq!(episodes[0].episode_number, 21);
        assert_eq!(episodes[1].episode_number, 22);
    }

    #[test]
    fn test_empty_input() {
        assert!(order_and_number(Vec::new()).is_empty());
    }
}
