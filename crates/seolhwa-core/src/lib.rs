//! Seolhwa Core - Domain models, records and shared types
//!
//! This crate defines the abstractions shared by the folklore pipeline:
//! - Source identity (origin, category, sequence number, pair key)
//! - Raw documents and sectioned text
//! - Narrator attributes
//! - Partial (single-origin) and merged story records
//! - Common error types
//! - Configuration management

pub mod config;
pub mod record;

pub use config::{AppConfig, ConfigError, ConvertConfig, LoggingConfig, MergeConfig, OcrConfig};
pub use record::{
    Elements, MergedContent, MergedMetadata, MergedRecord, PairStatus, PartialContent,
    PartialMetadata, PartialRecord, SourceDescriptor,
};

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for folklore processing
#[derive(Error, Debug)]
pub enum SeolhwaError {
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SeolhwaError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the path it happened on
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SeolhwaError>;

// ============================================================================
// Source Identity
// ============================================================================

/// Which extraction pipeline produced a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Content-focused extraction (summary, features, keywords)
    Content,
    /// Narrator/text-focused extraction (dialect transcript)
    Text,
    /// Legacy web-crawled source
    Web,
    #[default]
    Unknown,
}

impl Origin {
    /// Parse the single-letter filename code
    pub fn from_code(code: &str) -> Self {
        match code {
            "C" => Self::Content,
            "T" => Self::Text,
            "W" => Self::Web,
            _ => Self::Unknown,
        }
    }

    /// Single-letter filename code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Content => "C",
            Self::Text => "T",
            Self::Web => "W",
            Self::Unknown => "U",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Text => "text",
            Self::Web => "web",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse story category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Myth,
    Folktale,
    Legend,
    #[default]
    Unknown,
}

impl Category {
    /// Parse the single-letter filename code
    pub fn from_code(code: &str) -> Self {
        match code {
            "M" => Self::Myth,
            "F" => Self::Folktale,
            "L" => Self::Legend,
            _ => Self::Unknown,
        }
    }

    /// Single-letter filename code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Myth => "M",
            Self::Folktale => "F",
            Self::Legend => "L",
            Self::Unknown => "U",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Myth => "myth",
            Self::Folktale => "folktale",
            Self::Legend => "legend",
            Self::Unknown => "unknown",
        }
    }

    /// Output folder for merged records of this category
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Myth => "myths",
            Self::Folktale => "folktales",
            Self::Legend => "legends",
            Self::Unknown => "unknown",
        }
    }

    /// Korean display name
    pub fn name_ko(&self) -> &'static str {
        match self {
            Self::Myth => "신화",
            Self::Folktale => "민담",
            Self::Legend => "전설",
            Self::Unknown => "기타",
        }
    }

    /// Categories that have a dedicated output folder
    pub const KNOWN: [Category; 3] = [Self::Myth, Self::Folktale, Self::Legend];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static CURRENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([WCT])_([FML])_(\d+)_(.+)$").expect("static pattern"));
static LEGACY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([WCT])-([FML])-(\d+)_(.+)$").expect("static pattern"));

const KNOWN_EXTENSIONS: [&str; 3] = [".json", ".pdf", ".txt"];

/// Identity parsed from a source filename, e.g. `C_F_001_개와 닭의 원한.pdf`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    pub origin: Origin,
    pub category: Category,
    /// Zero-padded sequence number, kept verbatim
    pub number: String,
    pub title: String,
}

impl DocumentId {
    /// Parse a filename (with or without extension).
    ///
    /// Returns `None` when the name matches neither the `C_F_001_title`
    /// form nor the legacy `W-F-001_title` form. Web records converted from
    /// the legacy form are written as `W_F_001_title` and parse here too.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = strip_known_extension(file_name);
        let caps = CURRENT_ID
            .captures(stem)
            .or_else(|| LEGACY_ID.captures(stem))?;

        Some(Self {
            origin: Origin::from_code(&caps[1]),
            category: Category::from_code(&caps[2]),
            number: caps[3].to_string(),
            title: caps[4].to_string(),
        })
    }

    /// Parse a filename, falling back to the unknown placeholder identity
    pub fn parse_or_unknown(file_name: &str) -> Self {
        Self::parse(file_name).unwrap_or_else(|| Self::unknown(strip_known_extension(file_name)))
    }

    /// Placeholder identity for files that do not follow the naming scheme
    pub fn unknown(stem: impl Into<String>) -> Self {
        Self {
            origin: Origin::Unknown,
            category: Category::Unknown,
            number: "000".to_string(),
            title: stem.into(),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.origin != Origin::Unknown
    }

    /// Origin-qualified id, e.g. `C_F_001`
    pub fn source_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.origin.code(),
            self.category.code(),
            self.number
        )
    }

    /// Name of the partial record converted from this source, e.g. `C_F_001_title.json`
    pub fn record_file_name(&self) -> String {
        format!("{}_{}.json", self.source_id(), self.title)
    }

    /// Origin-independent story id, e.g. `story_F_001`
    pub fn story_id(&self) -> String {
        self.pair_key().story_id()
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.category, self.number.clone())
    }
}

fn strip_known_extension(file_name: &str) -> &str {
    KNOWN_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name)
}

/// Key linking the content and text records of the same story
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub category: Category,
    pub number: String,
}

impl PairKey {
    pub fn new(category: Category, number: impl Into<String>) -> Self {
        Self {
            category,
            number: number.into(),
        }
    }

    pub fn story_id(&self) -> String {
        format!("story_{}_{}", self.category.code(), self.number)
    }

    /// Source id of one side of this pair
    pub fn source_id(&self, origin: Origin) -> String {
        format!("{}_{}_{}", origin.code(), self.category.code(), self.number)
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.category.code(), self.number)
    }
}

// ============================================================================
// Documents and Sections
// ============================================================================

/// OCR output for one source file
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: DocumentId,
    /// Original file name, used for provenance
    pub file_name: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(id: DocumentId, file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            text: text.into(),
        }
    }
}

/// Named section of a folklore page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Summary,
    Content,
    Features,
    Keywords,
    Source,
    Related,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Self::Summary,
        Self::Content,
        Self::Features,
        Self::Keywords,
        Self::Source,
        Self::Related,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Content => "content",
            Self::Features => "features",
            Self::Keywords => "keywords",
            Self::Source => "source",
            Self::Related => "related",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sections recovered from raw text.
///
/// `None` means the marker for that section was not found; accessors
/// default to the empty string / empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedText {
    pub summary: Option<String>,
    pub content: Option<String>,
    pub features: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub source: Option<String>,
    pub related: Option<String>,
}

impl SectionedText {
    /// Text of a prose section. `Keywords` always yields "" here, see [`Self::keywords`].
    pub fn text(&self, section: Section) -> &str {
        let slot = match section {
            Section::Summary => &self.summary,
            Section::Content => &self.content,
            Section::Features => &self.features,
            Section::Source => &self.source,
            Section::Related => &self.related,
            Section::Keywords => return "",
        };
        slot.as_deref().unwrap_or("")
    }

    pub fn keywords(&self) -> &[String] {
        self.keywords.as_deref().unwrap_or(&[])
    }

    pub fn is_present(&self, section: Section) -> bool {
        match section {
            Section::Summary => self.summary.is_some(),
            Section::Content => self.content.is_some(),
            Section::Features => self.features.is_some(),
            Section::Keywords => self.keywords.is_some(),
            Section::Source => self.source.is_some(),
            Section::Related => self.related.is_some(),
        }
    }

    /// True when no marker was located at all
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| !self.is_present(*s))
    }
}

// ============================================================================
// Narrator
// ============================================================================

/// Narrator gender, persisted with the Korean labels used by the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "남")]
    Male,
    #[serde(rename = "여")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "남",
            Self::Female => "여",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Narrator attributes recovered from a transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarratorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl NarratorInfo {
    /// Build from individually extracted fields; `None` if every field is absent
    pub fn from_fields(
        name: Option<String>,
        gender: Option<Gender>,
        age: Option<u32>,
        location: Option<String>,
    ) -> Option<Self> {
        let info = Self {
            name,
            gender,
            age,
            location,
        };
        (!info.is_empty()).then_some(info)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.gender.is_none() && self.age.is_none() && self.location.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
