//! Seolhwa Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with sensible defaults for local runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Converter version stamped into every record
pub const DEFAULT_CONVERTER_VERSION: &str = "2.0.0";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// OCR collaborator configuration
    pub ocr: OcrConfig,

    /// Conversion (raw text -> partial record) settings
    pub convert: ConvertConfig,

    /// Merge (partial pair -> merged record) settings
    pub merge: MergeConfig,

    /// Optional TOML file replacing the built-in extraction rules
    pub rules_file: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // OCR
        if let Ok(language) = std::env::var("SEOLHWA_OCR_LANG") {
            config.ocr.language = language;
        }
        if let Ok(psm) = std::env::var("SEOLHWA_OCR_PSM") {
            config.ocr.psm = Some(psm.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SEOLHWA_OCR_PSM".to_string(),
                value: psm,
            })?);
        }
        if let Ok(path) = std::env::var("SEOLHWA_TESSERACT") {
            config.ocr.executable_path = Some(path);
        }

        // Conversion
        if let Ok(concurrency) = std::env::var("SEOLHWA_CONCURRENCY") {
            config.convert.concurrency =
                parse_concurrency(&concurrency).ok_or(ConfigError::InvalidValue {
                    key: "SEOLHWA_CONCURRENCY".to_string(),
                    value: concurrency,
                })?;
        }

        // Rules
        if let Ok(path) = std::env::var("SEOLHWA_RULES") {
            config.rules_file = Some(PathBuf::from(path));
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = parse_flag(&json).ok_or(ConfigError::InvalidValue {
                key: "LOG_JSON".to_string(),
                value: json,
            })?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Only override if env values differ from defaults
        if env_config.ocr.language != OcrConfig::default().language {
            self.ocr.language = env_config.ocr.language;
        }
        if env_config.ocr.psm.is_some() {
            self.ocr.psm = env_config.ocr.psm;
        }
        if env_config.ocr.executable_path.is_some() {
            self.ocr.executable_path = env_config.ocr.executable_path;
        }
        if env_config.convert.concurrency != ConvertConfig::default().concurrency {
            self.convert.concurrency = env_config.convert.concurrency;
        }
        if env_config.rules_file.is_some() {
            self.rules_file = env_config.rules_file;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        Ok(self)
    }
}

fn parse_concurrency(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|n| *n > 0)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// OCR collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code(s)
    pub language: String,

    /// Page segmentation mode (PSM)
    pub psm: Option<u8>,

    /// Path to tesseract executable
    pub executable_path: Option<String>,

    /// Separator placed between pages of one document
    pub page_separator: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "kor+eng".to_string(),
            psm: None,
            executable_path: None,
            page_separator: "\n\n".to_string(),
        }
    }
}

/// Conversion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Number of documents converted at once
    pub concurrency: usize,

    /// Stop after this many documents
    pub limit: Option<usize>,

    /// Version tag written into record metadata
    pub converter_version: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            limit: None,
            converter_version: DEFAULT_CONVERTER_VERSION.to_string(),
        }
    }
}

/// Merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Version tag written into merged record metadata
    pub converter_version: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            converter_version: DEFAULT_CONVERTER_VERSION.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ocr.language, "kor+eng");
        assert_eq!(config.ocr.page_separator, "\n\n");
        assert_eq!(config.convert.concurrency, 4);
        assert_eq!(config.merge.converter_version, "2.0.0");
        assert!(config.rules_file.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            rules_file = "rules.toml"

            [convert]
            concurrency = 8
            limit = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.convert.concurrency, 8);
        assert_eq!(config.convert.limit, Some(10));
        assert_eq!(config.convert.converter_version, "2.0.0");
        assert_eq!(config.ocr.language, "kor+eng");
        assert_eq!(config.rules_file, Some(PathBuf::from("rules.toml")));
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/seolhwa.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_concurrency("8"), Some(8));
        assert_eq!(parse_concurrency("0"), None);
        assert_eq!(parse_concurrency("many"), None);
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
