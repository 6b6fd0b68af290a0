//! Seolhwa OCR - Optical Character Recognition collaborator
//!
//! Turns scanned folklore pages into text using the Tesseract CLI, and
//! loads story sources (pre-extracted text files or directories of page
//! images) as one raw text string per story.

pub mod loader;

pub use loader::{DocumentLoader, SourceKind, StorySource};

use std::path::{Path, PathBuf};
use std::process::Command;

use seolhwa_core::OcrConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("OCR execution failed: {0}")]
    ExecutionFailed(String),

    #[error("No page images found in {0}")]
    NoPages(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OcrError>;

/// OCR result for a single page
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Extracted text content
    pub text: String,
    /// Page number (1-based)
    pub page: u32,
}

impl OcrResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Trait for OCR engines
pub trait OcrEngine: Send + Sync {
    /// Extract text from an image file
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult>;

    /// Extract text from page images in order
    fn extract_text_batch(&self, image_paths: &[&Path]) -> Result<Vec<OcrResult>> {
        image_paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let result = self.extract_text(path)?;
                Ok(result.with_page((i + 1) as u32))
            })
            .collect()
    }

    /// Check if the engine is available on the system
    fn is_available(&self) -> bool;

    /// Get the engine name
    fn name(&self) -> &str;
}

// ============================================================================
// Tesseract OCR Engine
// ============================================================================

/// Tesseract OCR engine configuration
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Language code(s) for OCR (e.g., "kor", "kor+eng")
    pub language: String,
    /// Page segmentation mode (PSM)
    pub psm: Option<u8>,
    /// Path to tesseract executable
    pub executable_path: Option<String>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            language: "kor+eng".to_string(),
            psm: None,
            executable_path: None,
        }
    }
}

impl From<&OcrConfig> for TesseractConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            psm: config.psm,
            executable_path: config.executable_path.clone(),
        }
    }
}

/// Tesseract OCR engine wrapper
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            config: TesseractConfig::default(),
        }
    }

    pub fn with_config(config: TesseractConfig) -> Self {
        Self { config }
    }

    fn executable(&self) -> &str {
        self.config
            .executable_path
            .as_deref()
            .unwrap_or("tesseract")
    }

    fn build_args(&self, image_path: &Path) -> Vec<String> {
        let mut args = vec![
            image_path.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.language.clone(),
        ];

        if let Some(psm) = self.config.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }

        args
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult> {
        let output = Command::new(self.executable())
            .args(self.build_args(image_path))
            .output()
            .map_err(|e| OcrError::ExecutionFailed(format!("{}: {e}", self.executable())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ExecutionFailed(format!(
                "Tesseract failed on {}: {stderr}",
                image_path.display()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(OcrResult::new(text))
    }

    fn is_available(&self) -> bool {
        Command::new(self.executable())
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

// ============================================================================
// OCR Manager
// ============================================================================

/// OCR manager that dispatches to the first registered engine
pub struct OcrManager {
    engines: Vec<Box<dyn OcrEngine>>,
}

impl OcrManager {
    /// Manager with Tesseract registered when it is installed
    pub fn new(config: &OcrConfig) -> Self {
        let mut manager = Self::empty();

        let tesseract = TesseractEngine::with_config(TesseractConfig::from(config));
        if tesseract.is_available() {
            manager.register(tesseract);
        } else {
            tracing::warn!("Tesseract not found; only pre-extracted text sources can be converted");
        }

        manager
    }

    /// Manager with no engines
    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    pub fn register<E: OcrEngine + 'static>(&mut self, engine: E) {
        self.engines.push(Box::new(engine));
    }

    pub fn is_available(&self) -> bool {
        !self.engines.is_empty()
    }

    pub fn available_engines(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    fn engine(&self) -> Result<&dyn OcrEngine> {
        self.engines
            .first()
            .map(|e| e.as_ref())
            .ok_or_else(|| OcrError::EngineNotAvailable("No OCR engines available".to_string()))
    }

    pub fn extract_text(&self, image_path: &Path) -> Result<OcrResult> {
        self.engine()?.extract_text(image_path)
    }

    pub fn extract_text_batch(&self, image_paths: &[&Path]) -> Result<Vec<OcrResult>> {
        self.engine()?.extract_text_batch(image_paths)
    }
}

// ============================================================================
// Tests
// ============================================================================
