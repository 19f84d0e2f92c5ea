//! Suggestion filters for completer callbacks.
//!
//! An empty needle returns the input unchanged in every filter.

use std::cmp::Ordering;

use crate::core::suggest::Suggest;

pub fn filter_has_prefix(suggests: &[Suggest], needle: &str, ignore_case: bool) -> Vec<Suggest> {
    filter_by(suggests, needle, ignore_case, |text, needle| {
        text.starts_with(needle)
    })
}

pub fn filter_has_suffix(suggests: &[Suggest], needle: &str, ignore_case: bool) -> Vec<Suggest> {
    filter_by(suggests, needle, ignore_case, |text, needle| text.ends_with(needle))
}

pub fn filter_contains(suggests: &[Suggest], needle: &str, ignore_case: bool) -> Vec<Suggest> {
    filter_by(suggests, needle, ignore_case, |text, needle| text.contains(needle))
}

/// Keeps suggestions whose text contains `needle` as a subsequence, best match first.
pub fn filter_fuzzy(suggests: &[Suggest], needle: &str, ignore_case: bool) -> Vec<Suggest> {
    if needle.is_empty() {
        return suggests.to_vec();
    }
    let needle = normalize(needle, ignore_case);

    let mut scored: Vec<(f64, &Suggest)> = suggests
        .iter()
        .filter_map(|suggest| {
            fuzzy_score(&needle, &normalize(&suggest.text, ignore_case))
                .map(|score| (score, suggest))
        })
        .collect();
    // Stable sort keeps the completer's order among equal scores.
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, suggest)| suggest.clone()).collect()
}

/// Subsequence score; lower is better, `None` when `needle` does not match.
///
/// Consecutive runs and matches on word boundaries pull the score down, gaps and late
/// matches push it up.
pub fn fuzzy_score(needle: &str, text: &str) -> Option<f64> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Some(0.0);
    }
    let text: Vec<char> = text.chars().collect();
    if needle.len() > text.len() {
        return None;
    }

    let mut matched = 0usize;
    let mut score = 0.0f64;
    // A match at index 0 counts as continuing a run.
    let mut last_match: isize = -1;
    let mut run = 0i32;

    for (i, ch) in text.iter().enumerate() {
        if matched == needle.len() {
            break;
        }
        if *ch != needle[matched] {
            continue;
        }

        let index = i as isize;
        if last_match == index - 1 {
            run += 1;
            score -= f64::from(run) * 5.0;
        } else {
            run = 0;
            if last_match >= 0 {
                score += (index - last_match - 1) as f64 * 2.0;
            }
        }

        if i == 0 || is_boundary(text[i - 1]) {
            score -= 10.0;
        }
        score += i as f64 * 0.1;

        last_match = index;
        matched += 1;
    }

    (matched == needle.len()).then_some(score)
}

fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '-' | '_' | '.' | '/' | ':')
}

fn filter_by<F>(suggests: &[Suggest], needle: &str, ignore_case: bool, keep: F) -> Vec<Suggest>
where
    F: Fn(&str, &str) -> bool,
{
    if needle.is_empty() {
        return suggests.to_vec();
    }
    let needle = normalize(needle, ignore_case);
    suggests
        .iter()
        .filter(|suggest| keep(&normalize(&suggest.text, ignore_case), &needle))
        .cloned()
        .collect()
}

fn normalize(text: &str, ignore_case: bool) -> String {
    if ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_contains, filter_fuzzy, filter_has_prefix, filter_has_suffix, fuzzy_score};
    use crate::core::suggest::Suggest;

    fn texts(suggests: &[Suggest]) -> Vec<&str> {
        suggests.iter().map(|s| s.text.as_str()).collect()
    }

    fn sample() -> Vec<Suggest> {
        ["users", "articles", "comments", "Groups"]
            .into_iter()
            .map(|text| Suggest::new(text, ""))
            .collect()
    }

    #[test]
    fn prefix_filter_respects_case_flag() {
        let suggests = sample();
        assert_eq!(texts(&filter_has_prefix(&suggests, "g", false)), Vec::<&str>::new());
        assert_eq!(texts(&filter_has_prefix(&suggests, "g", true)), vec!["Groups"]);
    }

    #[test]
    fn suffix_and_contains_filters() {
        let suggests = sample();
        assert_eq!(
            texts(&filter_has_suffix(&suggests, "s", false)),
            vec!["users", "articles", "comments", "Groups"]
        );
        assert_eq!(texts(&filter_contains(&suggests, "ment", false)), vec!["comments"]);
    }

    #[test]
    fn empty_needle_keeps_everything() {
        let suggests = sample();
        assert_eq!(filter_contains(&suggests, "", false), suggests);
        assert_eq!(filter_fuzzy(&suggests, "", true), suggests);
    }

    #[test]
    fn fuzzy_matches_subsequences_best_first() {
        let suggests: Vec<Suggest> = ["a_b_c", "abc", "xyz"]
            .into_iter()
            .map(|text| Suggest::new(text, ""))
            .collect();
        assert_eq!(texts(&filter_fuzzy(&suggests, "abc", false)), vec!["abc", "a_b_c"]);
    }

    #[test]
    fn fuzzy_score_rejects_missing_chars() {
        assert!(fuzzy_score("abd", "abc").is_none());
        assert!(fuzzy_score("abcd", "abc").is_none());
    }
}
