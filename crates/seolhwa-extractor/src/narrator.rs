//! Narrator attribute extraction from field transcripts
//!
//! Name, gender, age and location are extracted independently of each
//! other. The result is `None` unless at least one of them was found.

use regex::Regex;

use seolhwa_core::{Gender, NarratorInfo, Result};

use crate::rules::{compile, ExtractionRules, NarratorRules};

#[derive(Debug, Clone)]
pub struct NarratorExtractor {
    name: Regex,
    age: Regex,
    location: Regex,
    male_markers: Vec<String>,
    female_markers: Vec<String>,
}

impl NarratorExtractor {
    pub fn new(rules: &NarratorRules) -> Result<Self> {
        Ok(Self {
            name: compile(&rules.name_pattern)?,
            age: compile(&rules.age_pattern)?,
            location: compile(&rules.location_pattern)?,
            male_markers: rules.male_markers.clone(),
            female_markers: rules.female_markers.clone(),
        })
    }

    pub fn from_rules(rules: &ExtractionRules) -> Result<Self> {
        Self::new(&rules.narrator)
    }

    pub fn extract(&self, text: &str) -> Option<NarratorInfo> {
        NarratorInfo::from_fields(
            self.name(text),
            self.gender(text),
            self.age(text),
            self.location(text),
        )
    }

    fn name(&self, text: &str) -> Option<String> {
        first_capture(&self.name, text)
    }

    /// Male markers are checked first
    fn gender(&self, text: &str) -> Option<Gender> {
        let has_any = |markers: &[String]| markers.iter().any(|m| text.contains(m.as_str()));

        if has_any(&self.male_markers) {
            Some(Gender::Male)
        } else if has_any(&self.female_markers) {
            Some(Gender::Female)
        } else {
            None
        }
    }

    fn age(&self, text: &str) -> Option<u32> {
        first_capture(&self.age, text).and_then(|digits| digits.parse().ok())
    }

    fn location(&self, text: &str) -> Option<String> {
        first_capture(&self.location, text)
    }
}

/// Group 1 of the first match, or the whole match for group-less patterns
fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    let caps = regex.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> NarratorExtractor {
        NarratorExtractor::from_rules(&ExtractionRules::default()).unwrap()
    }

    #[test]
    fn test_full_narrator_line() {
        let info = extractor()
            .extract("구연자 김영희, 할머니, 70세, 서귀포시 안덕면")
            .unwrap();

        assert_eq!(info.name.as_deref(), Some("김영희"));
        assert_eq!(info.gender, Some(Gender::Female));
        assert_eq!(info.age, Some(70));
        assert_eq!(info.location.as_deref(), Some("안덕면"));
    }

    #[test]
    fn test_name_with_colon_label() {
        let info = extractor().extract("구연자:고순아").unwrap();
        assert_eq!(info.name.as_deref(), Some("고순아"));
    }

    #[test]
    fn test_male_takes_priority() {
        let info = extractor().extract("할아버지와 할머니가 함께 구술").unwrap();
        assert_eq!(info.gender, Some(Gender::Male));
    }

    #[test]
    fn test_partial_fields() {
        let info = extractor().extract("당시 82 세").unwrap();
        assert_eq!(info.age, Some(82));
        assert!(info.name.is_none());
        assert!(info.gender.is_none());
        assert!(info.location.is_none());
    }

    #[test]
    fn test_single_digit_age_ignored() {
        assert!(extractor().extract("7세").is_none());
    }

    #[test]
    fn test_absent_when_nothing_found() {
        assert!(extractor().extract("no narrator here").is_none());
        assert!(extractor().extract("").is_none());
    }

    #[test]
    fn test_location_suffixes() {
        let info = extractor().extract("조천읍에서 들은 이야기").unwrap();
        assert_eq!(info.location.as_deref(), Some("조천읍"));
    }
}
