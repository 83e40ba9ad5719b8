// trigram.rs — Trigram set similarity.
//
// The same padding scheme the database's trigram index uses: the
// lowercased string gets two leading spaces and one trailing space, so
// word boundaries weigh into the similarity. Similarity is Jaccard over
// the two trigram sets.

use std::collections::HashSet;

/// The padded trigram set of a string.
pub fn trigrams(text: &str) -> HashSet<String> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return HashSet::new();
    }

    let padded: Vec<char> = format!("  {} ", normalized).chars().collect();
    padded
        .windows(3)
        .map(|window| window.iter().collect())
        .collect()
}

/// Jaccard similarity of two strings' trigram sets, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let set_a = trigrams(a);
    let set_b = trigrams(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}
