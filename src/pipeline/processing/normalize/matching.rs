//! Approximate string matching against taxonomy candidates.

use strsim::normalized_levenshtein;

/// Similarity between two strings on a 0-100 scale, derived from normalized
/// Levenshtein distance. 100 means identical, 0 means nothing in common.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Best-scoring candidate for `query`. Candidates are scanned in order and
/// only a strictly greater score replaces the running best, so on a tie the
/// earliest candidate wins. Scores are compared unrounded.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(query, candidate);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best
}

/// Best-scoring candidate, accepted only at or above `threshold`.
pub fn best_match_over<'a, I>(query: &str, candidates: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    best_match(query, candidates)
        .filter(|(_, score)| *score >= threshold)
        .map(|(candidate, _)| candidate)
}
