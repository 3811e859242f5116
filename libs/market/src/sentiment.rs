//! Keyword sentiment for headlines that arrive without an upstream label.

const POSITIVE: &[&str] = &[
    "beat", "beats", "bullish", "boost", "boosts", "gain", "gains", "growth", "high", "jump",
    "jumps", "outperform", "profit", "profits", "rally", "rallies", "record", "rise", "rises",
    "soar", "soars", "strong", "surge", "surges", "upgrade", "upgraded", "win", "wins",
];

const NEGATIVE: &[&str] = &[
    "bearish", "crash", "cut", "cuts", "decline", "declines", "downgrade", "downgraded", "drop",
    "drops", "fall", "falls", "fraud", "lawsuit", "loss", "losses", "miss", "misses", "plunge",
    "plunges", "probe", "recall", "slump", "slumps", "tumble", "tumbles", "weak", "warning",
];

/// Score `text` in `[-1, 1]` as `(pos - neg) / (pos + neg + 1)`.
pub fn score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let (mut pos, mut neg) = (0u32, 0u32);

    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if POSITIVE.contains(&word) {
            pos += 1;
        } else if NEGATIVE.contains(&word) {
            neg += 1;
        }
    }

    (f64::from(pos) - f64::from(neg)) / f64::from(pos + neg + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(score(""), 0.0);
        assert_eq!(score("Tesla holds annual meeting"), 0.0);
    }

    #[test]
    fn positive_words_push_score_up() {
        let s = score("Tesla shares SURGE after earnings beat");
        assert!(s > 0.6, "got {s}");
    }

    #[test]
    fn negative_words_push_score_down() {
        let s = score("Apple faces lawsuit, shares fall");
        assert!(s < -0.6, "got {s}");
    }

    #[test]
    fn mixed_words_cancel() {
        assert_eq!(score("Gains erased as stock drops"), 0.0);
    }
}
