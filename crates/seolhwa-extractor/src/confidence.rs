//! OCR quality estimate from character-class ratios
//!
//! `confidence = min(1, hangul_ratio * 1.2) * max(0, 1 - broken_ratio * 2)`,
//! rounded to two decimals. Ratios are taken over non-whitespace characters.

use crate::rules::ExtractionRules;

const HANGUL_WEIGHT: f64 = 1.2;
const BROKEN_PENALTY: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    broken_glyphs: Vec<char>,
}

impl ConfidenceScorer {
    pub fn new(broken_glyphs: Vec<char>) -> Self {
        Self { broken_glyphs }
    }

    pub fn from_rules(rules: &ExtractionRules) -> Self {
        Self::new(rules.broken_glyphs.clone())
    }

    /// Score in [0.0, 1.0]; 0.0 for text with no visible characters
    pub fn score(&self, text: &str) -> f64 {
        let mut total = 0usize;
        let mut hangul = 0usize;
        let mut broken = 0usize;

        for c in text.chars().filter(|c| !c.is_whitespace()) {
            total += 1;
            if is_hangul_syllable(c) {
                hangul += 1;
            } else if self.broken_glyphs.contains(&c) {
                broken += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }

        let hangul_ratio = hangul as f64 / total as f64;
        let broken_ratio = broken as f64 / total as f64;

        let confidence =
            (hangul_ratio * HANGUL_WEIGHT).min(1.0) * (1.0 - broken_ratio * BROKEN_PENALTY).max(0.0);
        round2(confidence.max(0.0))
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::from_rules(&ExtractionRules::default())
    }
}

/// Precomposed Hangul syllable block (가..힣)
pub fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.score(""), 0.0);
        assert_eq!(scorer.score(" \n\t "), 0.0);
    }

    #[test]
    fn test_all_hangul_is_capped() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.score("옛날 옛적에 한라산"), 1.0);
    }

    #[test]
    fn test_only_broken_glyphs() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.score("□■◆◇○●"), 0.0);
    }

    #[test]
    fn test_mixed_text() {
        let scorer = ConfidenceScorer::default();
        // 4 hangul of 6 visible: min(1, 0.667 * 1.2) = 0.8
        assert_eq!(scorer.score("가나 다라 ab"), 0.8);
        // 3 hangul, 1 broken of 4: 0.9 * 0.5
        assert_eq!(scorer.score("가나다□"), 0.45);
    }

    #[test]
    fn test_heavy_breakage_floors_at_zero() {
        let scorer = ConfidenceScorer::default();
        // broken ratio 0.75 -> penalty factor negative
        assert_eq!(scorer.score("가□□□"), 0.0);
    }

    #[test]
    fn test_custom_glyphs() {
        let scorer = ConfidenceScorer::new(vec!['?']);
        assert_eq!(scorer.score("가나다?"), 0.45);
    }

    proptest! {
        #[test]
        fn prop_score_in_unit_interval(text in "\\PC{0,64}") {
            let score = ConfidenceScorer::default().score(&text);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
