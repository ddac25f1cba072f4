//! Approximate id matching.
//!
//! Users type ids from memory; a resolver picks the closest existing id by
//! comparing character bigrams. Each id is lowercased and padded with a
//! boundary marker that typed input cannot contain (`email` becomes
//! `\0email\0`) so the first and last characters carry weight, then
//! scored with the Dice coefficient
//! `2·|A∩B| / (|A| + |B|)` over bigram multisets.

use std::collections::HashMap;

use tracing::debug;

/// Minimum similarity a match must reach unless configured otherwise.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;

const BOUNDARY: char = '\0';

/// A resolved id.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    /// Similarity in `0.0..=1.0`; exactly 1.0 for an exact match
    pub score: f64,
}

type Bigrams = HashMap<(char, char), usize>;

/// Similarity index over a fixed set of ids.
#[derive(Debug)]
pub struct IdResolver {
    entries: Vec<(String, Bigrams, usize)>,
    threshold: f64,
}

impl IdResolver {
    pub fn new<I, S>(ids: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                let (grams, total) = bigrams(&id);
                (id, grams, total)
            })
            .collect();
        Self { entries, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best id for `query`, or `None` when nothing reaches the threshold.
    ///
    /// Equal scores are broken by picking the lexicographically smallest id.
    pub fn resolve(&self, query: &str) -> Option<Match> {
        if let Some((id, _, _)) = self.entries.iter().find(|(id, _, _)| id == query) {
            return Some(Match {
                id: id.clone(),
                score: 1.0,
            });
        }

        let (query_grams, query_total) = bigrams(query);
        let mut best: Option<Match> = None;
        for (id, grams, total) in &self.entries {
            let score = dice(&query_grams, query_total, grams, *total);
            let better = match &best {
                None => true,
                Some(current) => {
                    score > current.score || (score == current.score && *id < current.id)
                }
            };
            if better {
                best = Some(Match {
                    id: id.clone(),
                    score,
                });
            }
        }

        let best = best.filter(|candidate| candidate.score >= self.threshold);
        debug!(
            candidates = self.entries.len(),
            matched = best.is_some(),
            score = best.as_ref().map(|m| m.score),
            "resolved id"
        );
        best
    }
}

fn bigrams(id: &str) -> (Bigrams, usize) {
    let padded: Vec<char> = std::iter::once(BOUNDARY)
        .chain(id.chars().flat_map(char::to_lowercase))
        .chain(std::iter::once(BOUNDARY))
        .collect();

    let mut grams = Bigrams::new();
    for pair in padded.windows(2) {
        *grams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    let total = padded.len() - 1;
    (grams, total)
}

fn dice(a: &Bigrams, a_total: usize, b: &Bigrams, b_total: usize) -> f64 {
    let shared: usize = a
        .iter()
        .map(|(gram, count)| b.get(gram).map_or(0, |other| (*count).min(*other)))
        .sum();
    (2 * shared) as f64 / (a_total + b_total) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(ids: &[&str]) -> IdResolver {
        IdResolver::new(ids.iter().copied(), DEFAULT_MATCH_THRESHOLD)
    }

    #[test]
    fn test_exact_match_scores_one() {
        let found = resolver(&["github", "gitlab"]).resolve("github").unwrap();
        assert_eq!(found.id, "github");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_dropped_character_still_matches() {
        let found = resolver(&["github", "gitlab"]).resolve("githb").unwrap();
        assert_eq!(found.id, "github");
        assert!(found.score > 0.7 && found.score < 1.0);
    }

    #[test]
    fn test_transposition_matches() {
        let found = resolver(&["email"]).resolve("emial").unwrap();
        assert_eq!(found.id, "email");
        assert!((found.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_query_not_found() {
        assert!(resolver(&["github", "gitlab"]).resolve("zzzzz").is_none());
    }

    #[test]
    fn test_empty_set_not_found() {
        assert!(resolver(&[]).resolve("anything").is_none());
    }

    #[test]
    fn test_case_insensitive_scoring() {
        let found = resolver(&["GitHub"]).resolve("github").unwrap();
        assert_eq!(found.id, "GitHub");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_ties_pick_smallest_id() {
        // "ab" and "ba" share exactly the same overlap with "a".
        let forward = IdResolver::new(["ba", "ab"], 0.0).resolve("a").unwrap();
        let reverse = IdResolver::new(["ab", "ba"], 0.0).resolve("a").unwrap();
        assert_eq!(forward.id, "ab");
        assert_eq!(reverse.id, "ab");
    }

    #[test]
    fn test_dash_in_id_is_not_a_boundary() {
        // Only the trailing "b" is shared with the padded query.
        let found = IdResolver::new(["a-b"], 0.0).resolve("b").unwrap();
        assert!((found.score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_respected() {
        let strict = IdResolver::new(["email"], 0.6);
        assert!(strict.resolve("emial").is_none());
        assert_eq!(strict.threshold(), 0.6);

        let lenient = IdResolver::new(["email"], 0.5);
        assert_eq!(lenient.resolve("emial").unwrap().id, "email");
    }
}
