//! Seolhwa Extractor - Heuristic structure recovery for OCR'd folklore text
//!
//! Implements section segmentation, vocabulary-based entity extraction,
//! subcategory classification, narrator extraction and OCR confidence
//! scoring. All pattern tables come from [`rules::ExtractionRules`], so the
//! heuristics can be tuned or replaced without touching the algorithms.

use std::collections::BTreeSet;

use seolhwa_core::Category;

/// Trait for entity extractors
pub trait EntityExtractor: Send + Sync {
    /// Distinct entity strings found in `text`
    fn extract(&self, text: &str) -> BTreeSet<String>;
}

/// Trait for subcategory classifiers
pub trait SubcategoryClassifier: Send + Sync {
    /// Always returns a label; falls back to a category default
    fn classify(&self, text: &str, category: Category) -> String;
}

pub mod classify;
pub mod confidence;
pub mod convert;
pub mod narrator;
pub mod ner;
pub mod rules;
pub mod segment;

pub use classify::KeywordClassifier;
pub use confidence::ConfidenceScorer;
pub use convert::{StoryConverter, TextAnalysis};
pub use narrator::NarratorExtractor;
pub use ner::VocabularyExtractor;
pub use rules::ExtractionRules;
pub use segment::{SectionSegmenter, SectionSpan};
