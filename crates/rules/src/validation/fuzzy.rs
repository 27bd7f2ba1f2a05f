//! "Did you mean" suggestions for misspelled metric keys, and the rule-id
//! naming check.

/// Lowercase and drop separators so `hookRate`, `hook-rate` and `hook_rate`
/// compare equal.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Closest candidate by edit distance over folded spellings.
///
/// Nothing is suggested when the best candidate needs more edits than half
/// the longer of the two folded strings.
pub(crate) fn fuzzy_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let wanted = fold(input);
    candidates
        .iter()
        .map(|&c| {
            let folded = fold(c);
            let dist = levenshtein(&wanted, &folded);
            (c, dist, wanted.chars().count().max(folded.chars().count()))
        })
        .min_by_key(|&(_, dist, _)| dist)
        .filter(|&(_, dist, longest)| dist <= longest / 2)
        .map(|(c, _, _)| c)
}

/// Edit distance (insert, delete, substitute) with a single rolling row.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitute = diagonal + usize::from(ca != cb);
            row[j + 1] = substitute.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Rule ids are lowercase words of ASCII letters and digits joined by single hyphens.
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|word| {
            !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: &[&str] = &[
        "cpc", "ctr", "cpm", "hook_rate", "hold_rate", "frequency", "cvr", "atc_rate",
        "atc_to_purchase", "cpa", "aov", "roas",
    ];

    #[test]
    fn levenshtein_basic() {
        assert_eq!(levenshtein("frequency", "frequncy"), 1);
        assert_eq!(levenshtein("", "roas"), 4);
        assert_eq!(levenshtein("cpa", "cpa"), 0);
        assert_eq!(levenshtein("cpc", "cpm"), 1);
    }

    #[test]
    fn suggests_close_keys() {
        assert_eq!(fuzzy_match("hook_rat", METRICS), Some("hook_rate"));
        assert_eq!(fuzzy_match("atc_to_purchse", METRICS), Some("atc_to_purchase"));
        assert_eq!(fuzzy_match("holdRate", METRICS), Some("hold_rate"));
    }

    #[test]
    fn rejects_distant_keys() {
        assert_eq!(fuzzy_match("impressions_per_dollar", METRICS), None);
    }

    #[test]
    fn kebab_case_ids() {
        assert!(is_kebab_case("benchmarks-default"));
        assert!(is_kebab_case("q3-2025"));
        assert!(!is_kebab_case("Benchmarks"));
        assert!(!is_kebab_case("-leading"));
        assert!(!is_kebab_case("trailing-"));
        assert!(!is_kebab_case("double--hyphen"));
        assert!(!is_kebab_case("snake_case"));
        assert!(!is_kebab_case(""));
    }
}
