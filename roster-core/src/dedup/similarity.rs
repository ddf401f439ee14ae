// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Name similarity: Levenshtein edit distance and the threshold policy.

/// Minimum single-character insertions, deletions and substitutions needed
/// to turn `a` into `b`. Works on Unicode scalar values, not bytes.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Rolling rows over the (len(b)+1) x (len(a)+1) table.
    let mut previous: Vec<usize> = (0..=a.len()).collect();
    let mut current = vec![0; a.len() + 1];

    for j in 1..=b.len() {
        current[0] = j;
        for i in 1..=a.len() {
            let substitution = usize::from(a[i - 1] != b[j - 1]);
            current[i] = (current[i - 1] + 1)
                .min(previous[i] + 1)
                .min(previous[i - 1] + substitution);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[a.len()]
}

/// Thresholds deciding when two names count as similar.
///
/// A pair is similar when the normalized ratio exceeds `min_ratio` OR the
/// raw distance is at most `max_distance`. The OR lets short names with a
/// typo pass the distance cap and long names with several edits pass the ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityPolicy {
    /// Ratio that must be strictly exceeded (default 0.7).
    pub min_ratio: f64,
    /// Largest raw edit distance accepted regardless of ratio (default 2).
    pub max_distance: usize,
}

impl Default for SimilarityPolicy {
    fn default() -> Self {
        SimilarityPolicy {
            min_ratio: 0.7,
            max_distance: 2,
        }
    }
}

impl SimilarityPolicy {
    pub fn new(min_ratio: f64, max_distance: usize) -> Self {
        SimilarityPolicy {
            min_ratio,
            max_distance,
        }
    }

    /// Compares two full names case-insensitively.
    pub fn is_similar(&self, name_a: &str, name_b: &str) -> bool {
        let a = name_a.to_lowercase();
        let b = name_b.to_lowercase();
        let distance = edit_distance(&a, &b);
        ratio(distance, &a, &b) > self.min_ratio || distance <= self.max_distance
    }
}

/// `1 - distance / max_len`, or 1.0 when both strings are empty.
fn ratio(distance: usize, a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - distance as f64 / max_len as f64
}

/// Case-insensitive similarity ratio between two names, in `0.0..=1.0`.
pub fn similarity_ratio(name_a: &str, name_b: &str) -> f64 {
    let a = name_a.to_lowercase();
    let b = name_b.to_lowercase();
    ratio(edit_distance(&a, &b), &a, &b)
}

/// Whether two full names are similar under the default policy.
pub fn is_similar(name_a: &str, name_b: &str) -> bool {
    SimilarityPolicy::default().is_similar(name_a, name_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_distances() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
    }

    #[test]
    fn test_distance_counts_characters_not_bytes() {
        assert_eq!(edit_distance("zoe", "zoë"), 1);
    }

    #[test]
    fn test_one_typo_is_similar() {
        assert!(is_similar("Anna Smith", "Ana Smith"));
    }

    #[test]
    fn test_different_people_not_similar() {
        assert!(!is_similar("John Doe", "Jane Roe"));
    }

    #[test]
    fn test_case_is_ignored() {
        assert!(is_similar("JAN BAKKER", "jan bakker"));
        assert_eq!(similarity_ratio("JAN", "jan"), 1.0);
    }

    #[test]
    fn test_short_names_pass_distance_cap() {
        // ratio 1 - 2/4 = 0.5, but distance 2 <= 2
        assert!(is_similar("Al B", "Al C."));
    }

    #[test]
    fn test_long_names_pass_ratio() {
        // distance 3 over 30 chars: ratio 0.9
        assert!(is_similar(
            "Wilhelmina van der Berg-Jansen",
            "Wilhelmine van den Berg-Jansem"
        ));
    }

    #[test]
    fn test_both_empty_is_similar() {
        assert!(is_similar("", ""));
    }

    #[test]
    fn test_custom_policy() {
        let strict = SimilarityPolicy::new(0.95, 0);
        assert!(!strict.is_similar("Anna Smith", "Ana Smith"));
        assert!(strict.is_similar("Anna Smith", "anna smith"));
    }
}
