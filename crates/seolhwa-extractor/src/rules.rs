//! Declarative extraction rules
//!
//! Every heuristic table used by the extractors lives here as data.
//! Order matters wherever a table is a `Vec`: section discovery and
//! subcategory classification are both first-match-wins.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use seolhwa_core::{Category, Result, Section, SeolhwaError};

// ============================================================================
// Rule types
// ============================================================================

/// Marker pattern that opens a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    pub section: Section,
    pub pattern: String,
}

impl SectionMarker {
    pub fn new(section: Section, pattern: impl Into<String>) -> Self {
        Self {
            section,
            pattern: pattern.into(),
        }
    }
}

/// One vocabulary item: a literal term or a generative regex.
///
/// In TOML a bare string is a literal, `{ pattern = '\w+리' }` is a regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VocabularyEntry {
    Literal(String),
    Pattern { pattern: String },
}

impl VocabularyEntry {
    pub fn literal(term: impl Into<String>) -> Self {
        Self::Literal(term.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
        }
    }

    /// Regex source for this entry
    pub fn to_regex_source(&self) -> String {
        match self {
            Self::Literal(term) => regex::escape(term),
            Self::Pattern { pattern } => pattern.clone(),
        }
    }
}

/// Subcategory label and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl SubcategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Fallback labels when no subcategory rule matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcategoryDefaults {
    pub myth: String,
    pub folktale: String,
    pub legend: String,
    pub other: String,
}

impl SubcategoryDefaults {
    pub fn for_category(&self, category: Category) -> &str {
        match category {
            Category::Myth => &self.myth,
            Category::Folktale => &self.folktale,
            Category::Legend => &self.legend,
            Category::Unknown => &self.other,
        }
    }
}

impl Default for SubcategoryDefaults {
    fn default() -> Self {
        Self {
            myth: "기타 신화".to_string(),
            folktale: "기타 민담".to_string(),
            legend: "기타 전설".to_string(),
            other: "기타".to_string(),
        }
    }
}

/// Patterns used to pull narrator attributes out of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorRules {
    /// Label followed by the name; capture group 1 is the name
    pub name_pattern: String,
    pub male_markers: Vec<String>,
    pub female_markers: Vec<String>,
    /// Capture group 1 is the age digits
    pub age_pattern: String,
    /// Capture group 1 is the place name including its suffix
    pub location_pattern: String,
}

impl Default for NarratorRules {
    fn default() -> Self {
        Self {
            name_pattern: r"구연자[:\s]*([가-힣]+)".to_string(),
            male_markers: strings(&["남자", "남성", "할아버지", "하르방"]),
            female_markers: strings(&["여자", "여성", "할머니", "할망"]),
            age_pattern: r"(\d{2,3})\s*세".to_string(),
            location_pattern: r"([가-힣]+[리읍면동])".to_string(),
        }
    }
}

// ============================================================================
// Rule set
// ============================================================================

/// Complete rule set for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub section_markers: Vec<SectionMarker>,
    /// Regex character class splitting the keyword section
    pub keyword_delimiters: String,
    pub characters: Vec<VocabularyEntry>,
    pub locations: Vec<VocabularyEntry>,
    pub subcategories: Vec<SubcategoryRule>,
    pub subcategory_defaults: SubcategoryDefaults,
    pub narrator: NarratorRules,
    /// Glyphs OCR emits for unreadable characters
    pub broken_glyphs: Vec<char>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            section_markers: vec![
                SectionMarker::new(Section::Summary, r"[①1]\s*개요"),
                SectionMarker::new(Section::Content, r"[②2]\s*내용"),
                SectionMarker::new(Section::Features, r"[③3]\s*특징"),
                SectionMarker::new(Section::Keywords, r"[④4]\s*핵심어"),
                SectionMarker::new(Section::Source, r"[⑤5]\s*원전\s*서지사항"),
                SectionMarker::new(Section::Related, r"[⑥6]\s*관련\s*자료"),
            ],
            keyword_delimiters: r"[,，.。\n]".to_string(),
            characters: [
                "설문대할망",
                "오백장군",
                "영등신",
                "삼승할망",
                "할아버지",
                "할머니",
                "할망",
                "하르방",
                "장닭",
                "사왕",
                "용왕",
                "도깨비",
                "도채비",
                "부자",
                "선비",
                "처녀",
                "총각",
            ]
            .into_iter()
            .map(VocabularyEntry::literal)
            .collect(),
            locations: [
                "한라산",
                "백록담",
                "성산일출봉",
                "우도",
                "산방산",
                "송악산",
                "영실",
                "물영아리",
                "효돈천",
                "쇠소깍",
                "천지연",
                "정방폭포",
            ]
            .into_iter()
            .map(VocabularyEntry::literal)
            .chain(
                [r"\w+리", r"\w+동", r"\w+읍"]
                    .into_iter()
                    .map(VocabularyEntry::pattern),
            )
            .collect(),
            subcategories: vec![
                SubcategoryRule::new("창조신화", &["창조", "만들", "생겨", "태초", "세상"]),
                SubcategoryRule::new("본풀이", &["본풀이", "굿", "제사", "신앙", "무속"]),
                SubcategoryRule::new("지명유래", &["지명", "이름", "불리", "마을", "오름"]),
                SubcategoryRule::new("역사전설", &["역사", "조선", "왕", "장수", "전쟁"]),
                SubcategoryRule::new("인물전설", &["인물", "효자", "열녀", "선비", "부자"]),
                SubcategoryRule::new("자연전설", &["도깨비", "도채비", "귀신", "용", "뱀"]),
                SubcategoryRule::new("동물담", &["개", "닭", "소", "말", "돼지", "동물"]),
                SubcategoryRule::new("교훈담", &["교훈", "착한", "욕심", "벌", "복"]),
            ],
            subcategory_defaults: SubcategoryDefaults::default(),
            narrator: NarratorRules::default(),
            broken_glyphs: vec!['□', '■', '◆', '◇', '○', '●'],
        }
    }
}

impl ExtractionRules {
    /// Load a rule set from TOML; missing tables fall back to the built-ins
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SeolhwaError::io(path, e))?;
        let rules = Self::from_toml(&content)
            .map_err(|e| SeolhwaError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(
            "Loaded extraction rules from {} ({} markers, {} subcategories)",
            path.display(),
            rules.section_markers.len(),
            rules.subcategories.len()
        );
        Ok(rules)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SeolhwaError::Config(e.to_string()))
    }
}

/// Compile a pattern, reporting the offending source on failure
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SeolhwaError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
