//! Keyword-based subcategory classification
//!
//! Rules are tried in configured order and the first rule with any keyword
//! present in the text wins. When nothing matches, the category-specific
//! default label is returned, so classification never comes back empty.

use seolhwa_core::Category;

use crate::rules::{ExtractionRules, SubcategoryDefaults, SubcategoryRule};
use crate::SubcategoryClassifier;

/// First-match keyword classifier
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<SubcategoryRule>,
    defaults: SubcategoryDefaults,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<SubcategoryRule>, defaults: SubcategoryDefaults) -> Self {
        Self { rules, defaults }
    }

    pub fn from_rules(rules: &ExtractionRules) -> Self {
        Self::new(rules.subcategories.clone(), rules.subcategory_defaults.clone())
    }

    /// Name of the first rule with a keyword in `text`, if any
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw.as_str())))
            .map(|rule| rule.name.as_str())
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_rules(&ExtractionRules::default())
    }
}

impl SubcategoryClassifier for KeywordClassifier {
    fn classify(&self, text: &str, category: Category) -> String {
        self.first_match(text)
            .unwrap_or_else(|| self.defaults.for_category(category))
            .to_string()
    }
}
