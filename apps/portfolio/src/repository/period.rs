//! Most-recent-first ordering of experience entries.
//!
//! Period labels are free text ("2020 - 2022", "2022 - Sekarang", "2023"), so
//! a plain string sort misplaces ongoing and single-year entries. Entries are
//! ordered by the years found in the label instead.

use crate::models::content::Experience;

const ONGOING_MARKERS: &[&str] = &["sekarang", "present", "now", "current", "saat ini", "today"];

/// (end year, start year); ongoing periods end at `i32::MAX`.
/// Labels without any year sort after everything else.
fn period_key(label: &str) -> (i32, i32) {
    let years: Vec<i32> = label
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .filter_map(|token| token.parse().ok())
        .collect();

    let ongoing = is_ongoing(label);

    match (years.first(), years.last()) {
        (Some(&start), Some(&end)) => {
            let end = if ongoing { i32::MAX } else { end.max(start) };
            (end, start)
        }
        _ if ongoing => (i32::MAX, i32::MIN),
        _ => (i32::MIN, i32::MIN),
    }
}

/// Markers count only as whole words, so "Unknown" or "Snowflake" never match.
fn is_ongoing(label: &str) -> bool {
    let words: Vec<String> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    ONGOING_MARKERS.iter().any(|marker| {
        let marker: Vec<&str> = marker.split(' ').collect();
        words.windows(marker.len()).any(|window| window.iter().eq(marker.iter()))
    })
}

/// Stable sort, so entries with equal periods keep the backend's order.
pub fn sort_most_recent_first(entries: &mut [Experience]) {
    entries.sort_by(|a, b| period_key(&b.period).cmp(&period_key(&a.period)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(period: &str) -> Experience {
        Experience {
            period: period.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ongoing_period_comes_first() {
        let mut entries = vec![
            exp("2019 - 2020"),
            exp("2023"),
            exp("2015 - 2019"),
            exp("2022 - Sekarang"),
        ];
        sort_most_recent_first(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.period.as_str()).collect();
        assert_eq!(order, vec!["2022 - Sekarang", "2023", "2019 - 2020", "2015 - 2019"]);
    }

    #[test]
    fn test_labels_without_years_sort_last_and_stay_stable() {
        let mut entries = vec![exp("freelance"), exp("2021 - 2022"), exp("various")];
        sort_most_recent_first(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.period.as_str()).collect();
        assert_eq!(order, vec!["2021 - 2022", "freelance", "various"]);
    }

    #[test]
    fn test_marker_inside_another_word_is_not_ongoing() {
        assert_eq!(period_key("2018 - 2019 (Unknown team)"), (2019, 2018));
        assert_eq!(period_key("2017 - 2018 Snowflake"), (2018, 2017));
        assert_eq!(period_key("2020 - saat ini"), (i32::MAX, 2020));
        assert_eq!(period_key("2021 - now"), (i32::MAX, 2021));
    }

    #[test]
    fn test_present_with_start_year() {
        assert_eq!(period_key("Jan 2021 – Present"), (i32::MAX, 2021));
    }
}
