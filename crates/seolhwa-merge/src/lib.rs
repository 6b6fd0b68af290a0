//! Seolhwa Merge - Reconciliation of content and text records
//!
//! Every story is extracted twice: once from the content-focused page
//! (summary, features, keywords) and once from the field transcript
//! (dialect text, narrator). This crate pairs the two partial records by
//! [`PairKey`] and merges them into one [`MergedRecord`]:
//!
//! - title and type come from the content record when present
//! - summary, full text, features and keywords come only from the content record
//! - original text and narrator come only from the text record
//! - the subcategory is classified over both raw texts, content first
//! - character and location sets are unioned

pub mod batch;

pub use batch::{BatchMerger, MergeFailure, MergeStats, PairIndex, PairSlot};

use std::collections::BTreeSet;

use chrono::Utc;

use seolhwa_core::config::DEFAULT_CONVERTER_VERSION;
use seolhwa_core::{
    Elements, MergedContent, MergedMetadata, MergedRecord, Origin, PairKey, PairStatus,
    PartialRecord, Result, SourceDescriptor,
};
use seolhwa_extractor::{ExtractionRules, KeywordClassifier, NarratorExtractor, SubcategoryClassifier};

/// The records available for one story; at least one side is always present
#[derive(Debug, Clone, Copy)]
pub enum RecordPair<'a> {
    Both {
        content: &'a PartialRecord,
        text: &'a PartialRecord,
    },
    ContentOnly(&'a PartialRecord),
    TextOnly(&'a PartialRecord),
}

impl<'a> RecordPair<'a> {
    /// `None` when both sides are absent
    pub fn from_options(
        content: Option<&'a PartialRecord>,
        text: Option<&'a PartialRecord>,
    ) -> Option<Self> {
        match (content, text) {
            (Some(content), Some(text)) => Some(Self::Both { content, text }),
            (Some(content), None) => Some(Self::ContentOnly(content)),
            (None, Some(text)) => Some(Self::TextOnly(text)),
            (None, None) => None,
        }
    }

    pub fn content(&self) -> Option<&'a PartialRecord> {
        match *self {
            Self::Both { content, .. } | Self::ContentOnly(content) => Some(content),
            Self::TextOnly(_) => None,
        }
    }

    pub fn text(&self) -> Option<&'a PartialRecord> {
        match *self {
            Self::Both { text, .. } | Self::TextOnly(text) => Some(text),
            Self::ContentOnly(_) => None,
        }
    }

    /// Record supplying title and type: content first, else text
    pub fn primary(&self) -> &'a PartialRecord {
        match *self {
            Self::Both { content, .. } | Self::ContentOnly(content) => content,
            Self::TextOnly(text) => text,
        }
    }

    pub fn status(&self) -> PairStatus {
        match self {
            Self::Both { .. } => PairStatus::Paired,
            Self::ContentOnly(_) => PairStatus::ContentOnly,
            Self::TextOnly(_) => PairStatus::TextOnly,
        }
    }
}

/// Merges record pairs under the field precedence rules
#[derive(Debug, Clone)]
pub struct StoryMerger {
    classifier: KeywordClassifier,
    narrator: NarratorExtractor,
    converter_version: String,
}

impl StoryMerger {
    pub fn new(rules: &ExtractionRules) -> Result<Self> {
        Ok(Self {
            classifier: KeywordClassifier::from_rules(rules),
            narrator: NarratorExtractor::from_rules(rules)?,
            converter_version: DEFAULT_CONVERTER_VERSION.to_string(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.converter_version = version.into();
        self
    }

    /// Merge one pair. `key` is the identity shared by both sides.
    pub fn merge(&self, key: &PairKey, pair: RecordPair<'_>) -> MergedRecord {
        let primary = pair.primary();
        let content = pair.content();
        let text = pair.text();

        let content_raw = content.map(PartialRecord::raw_text).unwrap_or("");
        let text_raw = text.map(PartialRecord::raw_text).unwrap_or("");

        let combined = format!("{content_raw}{text_raw}");
        let subcategory = self.classifier.classify(&combined, primary.story_type);

        let narrator = if text_raw.is_empty() {
            None
        } else {
            self.narrator.extract(text_raw)
        };

        MergedRecord {
            id: key.story_id(),
            title: primary.title.clone(),
            title_alt: Vec::new(),
            story_type: primary.story_type,
            category: subcategory,
            content: MergedContent {
                summary: content
                    .map(|c| c.content.summary.clone())
                    .unwrap_or_default(),
                full_text: content
                    .map(|c| c.content.full_text.clone())
                    .unwrap_or_default(),
                original_text: text_raw.to_string(),
                features: content
                    .map(|c| c.content.features.clone())
                    .unwrap_or_default(),
                narrator,
            },
            elements: Elements {
                characters: union(content, text, |r| &r.elements.characters),
                locations: union(content, text, |r| &r.elements.locations),
                keywords: content
                    .map(|c| c.elements.keywords.clone())
                    .unwrap_or_default(),
                themes: Vec::new(),
            },
            sources: provenance(pair),
            metadata: MergedMetadata {
                source_ids: [content, text]
                    .into_iter()
                    .flatten()
                    .map(|r| r.metadata.source_id.clone())
                    .collect(),
                has_dialect: !text_raw.is_empty(),
                pair_status: pair.status(),
                converted_at: Utc::now(),
                converter_version: self.converter_version.clone(),
            },
        }
    }
}

fn union(
    content: Option<&PartialRecord>,
    text: Option<&PartialRecord>,
    field: fn(&PartialRecord) -> &BTreeSet<String>,
) -> BTreeSet<String> {
    [content, text]
        .into_iter()
        .flatten()
        .flat_map(|r| field(r).iter().cloned())
        .collect()
}

/// One descriptor per present side, content first
fn provenance(pair: RecordPair<'_>) -> Vec<SourceDescriptor> {
    let mut sources = Vec::with_capacity(2);

    if let Some(content) = pair.content() {
        let mut source = SourceDescriptor::pdf(source_file(content), Origin::Content);
        if let Some(reference) = content.source_reference() {
            source = source.with_reference(reference);
        }
        sources.push(source);
    }

    if let Some(text) = pair.text() {
        sources.push(SourceDescriptor::pdf(source_file(text), Origin::Text));
    }

    sources
}

fn source_file(record: &PartialRecord) -> String {
    record
        .source_file()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.pdf", record.metadata.source_id))
}
