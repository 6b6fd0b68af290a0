//! Raw document -> partial record conversion
//!
//! Wires the segmenter, entity extractors, classifier, narrator extractor
//! and confidence scorer into a single pure transformation.

use std::collections::BTreeSet;

use chrono::Utc;

use seolhwa_core::config::DEFAULT_CONVERTER_VERSION;
use seolhwa_core::{
    Elements, NarratorInfo, Origin, PartialContent, PartialMetadata, PartialRecord, RawDocument,
    Result, Section, SectionedText, SourceDescriptor,
};

use crate::classify::KeywordClassifier;
use crate::confidence::ConfidenceScorer;
use crate::narrator::NarratorExtractor;
use crate::ner::VocabularyExtractor;
use crate::rules::ExtractionRules;
use crate::segment::SectionSegmenter;
use crate::{EntityExtractor, SubcategoryClassifier};

/// Everything the heuristics recover from one text
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub sections: SectionedText,
    pub characters: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub narrator: Option<NarratorInfo>,
    pub confidence: f64,
}

/// Converts OCR output into single-origin story records
#[derive(Debug, Clone)]
pub struct StoryConverter {
    segmenter: SectionSegmenter,
    characters: VocabularyExtractor,
    locations: VocabularyExtractor,
    classifier: KeywordClassifier,
    narrator: NarratorExtractor,
    scorer: ConfidenceScorer,
    converter_version: String,
}

impl StoryConverter {
    /// Build every extractor from one rule set; fails on the first invalid pattern
    pub fn new(rules: &ExtractionRules) -> Result<Self> {
        Ok(Self {
            segmenter: SectionSegmenter::from_rules(rules)?,
            characters: VocabularyExtractor::characters(rules)?,
            locations: VocabularyExtractor::locations(rules)?,
            classifier: KeywordClassifier::from_rules(rules),
            narrator: NarratorExtractor::from_rules(rules)?,
            scorer: ConfidenceScorer::from_rules(rules),
            converter_version: DEFAULT_CONVERTER_VERSION.to_string(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.converter_version = version.into();
        self
    }

    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    /// Run every heuristic over `text`
    pub fn analyze(&self, text: &str) -> TextAnalysis {
        TextAnalysis {
            sections: self.segmenter.segment(text),
            characters: self.characters.extract(text),
            locations: self.locations.extract(text),
            narrator: self.narrator.extract(text),
            confidence: self.scorer.score(text),
        }
    }

    pub fn convert(&self, doc: &RawDocument) -> PartialRecord {
        let analysis = self.analyze(&doc.text);
        let sections = &analysis.sections;
        let id = &doc.id;

        let subcategory = self
            .classifier
            .classify(sections.text(Section::Content), id.category);

        // Content pages carry no narrator block
        let narrator = match id.origin {
            Origin::Content => None,
            _ => analysis.narrator,
        };

        let mut source = SourceDescriptor::pdf(doc.file_name.clone(), id.origin);
        let reference = sections.text(Section::Source);
        if !reference.is_empty() {
            source = source.with_reference(reference);
        }

        PartialRecord {
            id: id.story_id(),
            title: id.title.clone(),
            story_type: id.category,
            category: subcategory,
            content: PartialContent {
                summary: sections.text(Section::Summary).to_string(),
                full_text: sections.text(Section::Content).to_string(),
                features: sections.text(Section::Features).to_string(),
                raw_text: doc.text.clone(),
                narrator,
            },
            elements: Elements {
                characters: analysis.characters,
                locations: analysis.locations,
                keywords: sections.keywords().to_vec(),
                themes: Vec::new(),
            },
            sources: vec![source],
            metadata: PartialMetadata {
                source_type: id.origin,
                source_id: id.source_id(),
                number: id.number.clone(),
                converted_at: Utc::now(),
                converter_version: self.converter_version.clone(),
                ocr_confidence: analysis.confidence,
            },
        }
    }
}
