//! Name similarity scoring
//!
//! Pluggable similarity function used by the fuzzy fallback, so the matching
//! strategy can be tuned or swapped without touching the reconciler.

use strsim::jaro_winkler;

/// Scores how likely two normalized identity keys name the same person.
/// Implementations return a value in `[0.0, 1.0]` where `1.0` is identical.
pub trait NameSimilarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaro-Winkler similarity. Weights shared prefixes, which suits person
/// names where sources disagree late in the string (suffixes, middle
/// initials, truncation).
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerSimilarity;

impl NameSimilarity for JaroWinklerSimilarity {
    fn score(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_keys_score_one() {
        let sim = JaroWinklerSimilarity;
        assert_eq!(sim.score("jon rahm", "jon rahm"), 1.0);
    }

    #[test]
    fn close_spellings_score_above_the_default_threshold() {
        let sim = JaroWinklerSimilarity;
        assert!(sim.score("thomas pieters", "thomas peters") > 0.92);
    }

    #[test]
    fn unrelated_names_score_low() {
        let sim = JaroWinklerSimilarity;
        assert!(sim.score("jon rahm", "collin morikawa") < 0.7);
    }
}
