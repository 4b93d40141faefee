//! "Did you mean...?" suggestions for unresolved identifiers: Levenshtein
//! distance against every in-scope name, threshold `max(2, name.len() /
//! 2)`, at most three suggestions, closest first.

/// Classic full matrix edit distance; names here are short identifiers so
/// the `O(n*m)` cost is immaterial.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }
    let mut row: Vec<usize> = (0..=m).collect();
    for i in 1..=n {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=m {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = tmp;
        }
    }
    row[m]
}

/// Up to three candidate names within the distance threshold, ordered by
/// increasing distance then lexicographically for ties.
pub fn suggest(name: &str, candidates: &[String]) -> Vec<String> {
    let threshold = (name.chars().count() / 2).max(2);
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .filter(|c| c.as_str() != name)
        .map(|c| (levenshtein(name, c), c))
        .filter(|(d, _)| *d <= threshold)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(3).map(|(_, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_distance_zero() {
        assert_eq!(levenshtein("foo", "foo"), 0);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(levenshtein("cat", "bat"), 1);
    }

    #[test]
    fn suggests_close_names_only() {
        let candidates = vec!["length".to_string(), "len".to_string(), "xyz123".to_string()];
        let suggestions = suggest("lenght", &candidates);
        assert!(suggestions.contains(&"length".to_string()));
        assert!(!suggestions.contains(&"xyz123".to_string()));
    }

    #[test]
    fn caps_at_three_suggestions() {
        let candidates: Vec<String> = vec!["aaa", "aab", "aac", "aad", "aae"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(suggest("aaa", &candidates).len(), 3);
    }
}
