//! Vocabulary-based entity extraction
//!
//! Characters and locations are recognized by presence only: every
//! vocabulary pattern is matched against the text and each distinct match
//! is collected. No positions or confidences are kept.

use std::collections::BTreeSet;

use regex::Regex;

use seolhwa_core::Result;

use crate::rules::{compile, ExtractionRules, VocabularyEntry};
use crate::EntityExtractor;

/// Extractor over an ordered vocabulary of literals and generative patterns
#[derive(Debug, Clone)]
pub struct VocabularyExtractor {
    patterns: Vec<Regex>,
}

impl VocabularyExtractor {
    pub fn new(vocabulary: &[VocabularyEntry]) -> Result<Self> {
        let patterns = vocabulary
            .iter()
            .map(|entry| compile(&entry.to_regex_source()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Known character and spirit names
    pub fn characters(rules: &ExtractionRules) -> Result<Self> {
        Self::new(&rules.characters)
    }

    /// Place names and administrative-suffix patterns
    pub fn locations(rules: &ExtractionRules) -> Result<Self> {
        Self::new(&rules.locations)
    }
}

impl EntityExtractor for VocabularyExtractor {
    fn extract(&self, text: &str) -> BTreeSet<String> {
        self.patterns
            .iter()
            .flat_map(|regex| regex.find_iter(text))
            .map(|mat| mat.as_str().to_string())
            .collect()
    }
}
