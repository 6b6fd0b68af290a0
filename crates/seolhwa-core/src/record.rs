//! Persisted story records
//!
//! A [`PartialRecord`] is produced per source file by one of the two
//! extraction pipelines. A [`MergedRecord`] is the canonical story built
//! from up to two partial records sharing a [`PairKey`](crate::PairKey).

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Category, DocumentId, NarratorInfo, Origin, Result, SeolhwaError};

/// Kind tag written into every source descriptor
pub const SOURCE_KIND_PDF: &str = "pdf";

// ============================================================================
// Shared pieces
// ============================================================================

/// Extracted story elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Elements {
    #[serde(default)]
    pub characters: BTreeSet<String>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// Provenance of a record: which file and which origin contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: String,
    #[serde(default)]
    pub content_type: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SourceDescriptor {
    pub fn pdf(file: impl Into<String>, content_type: Origin) -> Self {
        Self {
            kind: SOURCE_KIND_PDF.to_string(),
            file: file.into(),
            content_type,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// ============================================================================
// Partial record
// ============================================================================

/// Text fields of a single-origin record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialContent {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub features: String,
    /// Unsegmented OCR text
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub narrator: Option<NarratorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMetadata {
    pub source_type: Origin,
    pub source_id: String,
    #[serde(default)]
    pub number: String,
    pub converted_at: DateTime<Utc>,
    pub converter_version: String,
    /// Heuristic OCR quality in [0.0, 1.0]
    pub ocr_confidence: f64,
}

/// Structured result for one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub story_type: Category,
    /// Subcategory label, e.g. 창조신화
    pub category: String,
    pub content: PartialContent,
    pub elements: Elements,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    pub metadata: PartialMetadata,
}

impl PartialRecord {
    pub fn origin(&self) -> Origin {
        self.metadata.source_type
    }

    pub fn raw_text(&self) -> &str {
        &self.content.raw_text
    }

    /// Source file name recorded at conversion time, if any
    pub fn source_file(&self) -> Option<&str> {
        self.sources.first().map(|s| s.file.as_str())
    }

    /// Bibliographic reference recorded at conversion time, if any
    pub fn source_reference(&self) -> Option<&str> {
        self.sources.first().and_then(|s| s.reference.as_deref())
    }

    /// File name used when persisting, e.g. `C_F_001_개와 닭의 원한.json`
    pub fn file_name(&self) -> String {
        self.document_id().record_file_name()
    }

    /// Identity reconstructed from the record itself
    pub fn document_id(&self) -> DocumentId {
        DocumentId {
            origin: self.metadata.source_type,
            category: self.story_type,
            number: self.metadata.number.clone(),
            title: self.title.clone(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

// ============================================================================
// Merged record
// ============================================================================

/// How many origins contributed to a merged record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    Paired,
    ContentOnly,
    TextOnly,
}

/// Text fields of a merged record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedContent {
    pub summary: String,
    pub full_text: String,
    /// Raw transcript from the text-origin record (dialect)
    pub original_text: String,
    pub features: String,
    #[serde(default)]
    pub narrator: Option<NarratorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMetadata {
    pub source_ids: Vec<String>,
    pub has_dialect: bool,
    pub pair_status: PairStatus,
    pub converted_at: DateTime<Utc>,
    pub converter_version: String,
}

/// Canonical story built from one or two partial records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub title_alt: Vec<String>,
    #[serde(rename = "type")]
    pub story_type: Category,
    pub category: String,
    pub content: MergedContent,
    pub elements: Elements,
    pub sources: Vec<SourceDescriptor>,
    pub metadata: MergedMetadata,
}

impl MergedRecord {
    /// Output folder name for this record's category
    pub fn folder(&self) -> &'static str {
        self.story_type.folder()
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

// ============================================================================
// JSON helpers
// ============================================================================

/// Read a JSON document, attaching the path to any error
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| SeolhwaError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| SeolhwaError::json(path, e))
}

/// Write pretty JSON (non-ASCII kept as is), attaching the path to any error
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(|e| SeolhwaError::json(path, e))?;
    std::fs::write(path, body).map_err(|e| SeolhwaError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gender;

    fn sample_partial() -> PartialRecord {
        PartialRecord {
            id: "story_F_001".to_string(),
            title: "개와 닭의 원한".to_string(),
            story_type: Category::Folktale,
            category: "동물담".to_string(),
            content: PartialContent {
                raw_text: "옛날 옛적에".to_string(),
                narrator: Some(NarratorInfo {
                    gender: Some(Gender::Male),
                    ..Default::default()
                }),
                ..Default::default()
            },
            elements: Elements {
                characters: ["장닭".to_string()].into_iter().collect(),
                ..Default::default()
            },
            sources: vec![SourceDescriptor::pdf("C_F_001_개와 닭의 원한.pdf", Origin::Content)
                .with_reference("제주설화집")],
            metadata: PartialMetadata {
                source_type: Origin::Content,
                source_id: "C_F_001".to_string(),
                number: "001".to_string(),
                converted_at: Utc::now(),
                converter_version: "2.0.0".to_string(),
                ocr_confidence: 0.87,
            },
        }
    }

    #[test]
    fn test_partial_record_json_shape() {
        let record = sample_partial();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "folktale");
        assert_eq!(value["content"]["narrator"]["gender"], "남");
        assert_eq!(value["elements"]["characters"][0], "장닭");
        assert_eq!(value["sources"][0]["type"], "pdf");
        assert_eq!(value["metadata"]["source_type"], "content");
    }

    #[test]
    fn test_partial_record_identity() {
        let record = sample_partial();
        assert_eq!(record.file_name(), "C_F_001_개와 닭의 원한.json");
        assert_eq!(record.source_reference(), Some("제주설화집"));

        let id = record.document_id();
        assert_eq!(id.source_id(), "C_F_001");
        assert_eq!(id.title, "개와 닭의 원한");
    }

    #[test]
    fn test_partial_record_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = sample_partial();

        record.save(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("개와 닭의 원한"));

        let loaded = PartialRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_reports_path_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PartialRecord::load(&path).unwrap_err();
        assert!(matches!(err, SeolhwaError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
