//! Story source discovery and loading
//!
//! A story source is either a `.txt` file holding text that was already
//! recognized, or a directory whose page images are OCR'd in file-name
//! order and joined with the configured page separator.

use std::path::{Path, PathBuf};

use seolhwa_core::OcrConfig;

use crate::{OcrError, OcrManager, Result};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Pre-extracted text file
    Text,
    /// Directory of page images
    PageImages,
}

/// One discovered story source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySource {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl StorySource {
    /// File or directory name used for identity parsing and provenance
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Loads story sources into raw text
pub struct DocumentLoader {
    ocr: OcrManager,
    page_separator: String,
}

impl DocumentLoader {
    pub fn new(ocr: OcrManager, config: &OcrConfig) -> Self {
        Self {
            ocr,
            page_separator: config.page_separator.clone(),
        }
    }

    /// Recursively find story sources under `root`, sorted by path.
    ///
    /// `root` itself is never a source; images lying next to text files or
    /// subdirectories are not pages of a story and are skipped.
    pub fn discover(root: &Path) -> Result<Vec<StorySource>> {
        let mut sources = Vec::new();
        collect_sources(root, &mut sources)?;
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(sources)
    }

    /// Classify a single path as a story source
    pub fn source_for(path: &Path) -> Result<Option<StorySource>> {
        if path.is_file() {
            return Ok(is_text_file(path).then(|| StorySource {
                path: path.to_path_buf(),
                kind: SourceKind::Text,
            }));
        }

        if path.is_dir() && is_page_directory(path)? {
            return Ok(Some(StorySource {
                path: path.to_path_buf(),
                kind: SourceKind::PageImages,
            }));
        }

        Ok(None)
    }

    /// Raw text of one source; pages are joined with the page separator
    pub fn load(&self, source: &StorySource) -> Result<String> {
        match source.kind {
            SourceKind::Text => std::fs::read_to_string(&source.path).map_err(|e| OcrError::Io {
                path: source.path.clone(),
                source: e,
            }),
            SourceKind::PageImages => {
                let pages = page_images(&source.path)?;
                if pages.is_empty() {
                    return Err(OcrError::NoPages(source.path.clone()));
                }

                let refs: Vec<&Path> = pages.iter().map(PathBuf::as_path).collect();
                let results = self.ocr.extract_text_batch(&refs)?;
                tracing::debug!(
                    "OCR finished for {} ({} pages)",
                    source.path.display(),
                    results.len()
                );

                Ok(results
                    .into_iter()
                    .map(|r| r.text)
                    .collect::<Vec<_>>()
                    .join(&self.page_separator))
            }
        }
    }
}

fn collect_sources(dir: &Path, sources: &mut Vec<StorySource>) -> Result<()> {
    for entry in read_dir(dir)? {
        let hidden = entry.file_name().map(|n| n.to_string_lossy().starts_with('_'));
        if hidden.unwrap_or(false) {
            continue;
        }

        if entry.is_dir() {
            if is_page_directory(&entry)? {
                sources.push(StorySource {
                    path: entry,
                    kind: SourceKind::PageImages,
                });
            } else {
                collect_sources(&entry, sources)?;
            }
        } else if is_text_file(&entry) {
            sources.push(StorySource {
                path: entry,
                kind: SourceKind::Text,
            });
        } else if is_image_file(&entry) {
            tracing::debug!("Skipping stray image {}", entry.display());
        }
    }

    Ok(())
}

/// A directory holding page images and nothing else that is a source
fn is_page_directory(dir: &Path) -> Result<bool> {
    let entries = read_dir(dir)?;
    if entries.iter().any(|p| p.is_dir() || is_text_file(p)) {
        return Ok(false);
    }
    Ok(entries.iter().any(|p| is_image_file(p)))
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |e| OcrError::Io {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(read_dir(dir)?
        .into_iter()
        .filter(|p| is_image_file(p))
        .collect())
}

fn is_image_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, &IMAGE_EXTENSIONS)
}

fn is_text_file(path: &Path) -> bool {
    has_extension(path, &["txt"])
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OcrEngine, OcrResult};

    struct FileNameEngine;

    impl OcrEngine for FileNameEngine {
        fn extract_text(&self, image_path: &Path) -> crate::Result<OcrResult> {
            let stem = image_path.file_stem().unwrap().to_string_lossy();
            Ok(OcrResult::new(stem.into_owned()))
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "file-name"
        }
    }

    fn loader() -> DocumentLoader {
        let mut ocr = OcrManager::empty();
        ocr.register(FileNameEngine);
        DocumentLoader::new(ocr, &OcrConfig::default())
    }

    #[test]
    fn test_discover_text_and_image_sources() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        std::fs::write(root.join("C_F_001_개와 닭의 원한.txt"), "본문").unwrap();
        std::fs::write(root.join("notes.md"), "무시").unwrap();
        std::fs::write(root.join("_summary.txt"), "무시").unwrap();

        let pages = root.join("myths").join("T_M_002_영등신");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("p02.png"), b"").unwrap();
        std::fs::write(pages.join("p01.png"), b"").unwrap();

        let sources = DocumentLoader::discover(root).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, SourceKind::Text);
        assert_eq!(sources[0].file_name(), "C_F_001_개와 닭의 원한.txt");
        assert_eq!(sources[1].kind, SourceKind::PageImages);
        assert_eq!(sources[1].file_name(), "T_M_002_영등신");
    }

    #[test]
    fn test_stray_image_does_not_hide_text_sources() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        std::fs::write(root.join("cover.png"), b"").unwrap();
        std::fs::write(root.join("C_F_001_개와 닭.txt"), "본문").unwrap();
        std::fs::write(root.join("T_F_001_개와 닭.txt"), "본문").unwrap();

        let sources = DocumentLoader::discover(root).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| s.kind == SourceKind::Text));
    }

    #[test]
    fn test_directory_with_text_is_walked_not_ocrd() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("legends");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("scan.jpg"), b"").unwrap();
        std::fs::write(folder.join("C_L_003_오백장군.txt"), "본문").unwrap();

        assert!(DocumentLoader::source_for(&folder).unwrap().is_none());

        let sources = DocumentLoader::discover(dir.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name(), "C_L_003_오백장군.txt");
    }

    #[test]
    fn test_load_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("T_M_002_영등신");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("p02.png"), b"").unwrap();
        std::fs::write(pages.join("p01.jpg"), b"").unwrap();

        let source = DocumentLoader::source_for(&pages).unwrap().unwrap();
        let text = loader().load(&source).unwrap();
        assert_eq!(text, "p01\n\np02");
    }

    #[test]
    fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C_L_010_오백장군.txt");
        std::fs::write(&path, "① 개요 오백장군").unwrap();

        let source = DocumentLoader::source_for(&path).unwrap().unwrap();
        assert_eq!(loader().load(&source).unwrap(), "① 개요 오백장군");
    }

    #[test]
    fn test_images_without_engine_fail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p01.png"), b"").unwrap();

        let source = DocumentLoader::source_for(dir.path()).unwrap().unwrap();
        let loader = DocumentLoader::new(OcrManager::empty(), &OcrConfig::default());
        assert!(matches!(
            loader.load(&source),
            Err(OcrError::EngineNotAvailable(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = DocumentLoader::discover(Path::new("/nonexistent/seolhwa")).unwrap_err();
        assert!(matches!(err, OcrError::Io { .. }));
    }
}
