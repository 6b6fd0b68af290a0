//! Batch conversion of story sources into partial records

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use seolhwa_core::record::write_json;
use seolhwa_core::{DocumentId, PartialRecord, RawDocument};
use seolhwa_extractor::StoryConverter;
use seolhwa_ocr::{DocumentLoader, StorySource};

pub const SUMMARY_FILE: &str = "_conversion_summary.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Failed,
}

/// Outcome for one input
#[derive(Debug, Clone, Serialize)]
pub struct ConversionEntry {
    pub source: String,
    pub status: ConversionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionEntry {
    fn success(source: String, output: String, confidence: f64) -> Self {
        Self {
            source,
            status: ConversionStatus::Success,
            output: Some(output),
            ocr_confidence: Some(confidence),
            error: None,
        }
    }

    fn failed(source: String, error: String) -> Self {
        Self {
            source,
            status: ConversionStatus::Failed,
            output: None,
            ocr_confidence: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub files: Vec<ConversionEntry>,
}

/// Converts every story source under a directory, `concurrency` at a time
pub struct BatchConverter {
    converter: Arc<StoryConverter>,
    loader: Arc<DocumentLoader>,
    concurrency: usize,
}

impl BatchConverter {
    pub fn new(converter: StoryConverter, loader: DocumentLoader, concurrency: usize) -> Self {
        Self {
            converter: Arc::new(converter),
            loader: Arc::new(loader),
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        limit: Option<usize>,
    ) -> anyhow::Result<ConversionSummary> {
        let mut sources = DocumentLoader::discover(input)
            .with_context(|| format!("Failed to scan {}", input.display()))?;
        if let Some(limit) = limit {
            sources.truncate(limit);
        }
        tracing::info!("Found {} story sources in {}", sources.len(), input.display());

        std::fs::create_dir_all(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;

        let (sources, collisions) = claim_output_names(sources);

        let mut files: Vec<ConversionEntry> = stream::iter(sources)
            .map(|source| {
                let converter = Arc::clone(&self.converter);
                let loader = Arc::clone(&self.loader);
                let output = output.to_path_buf();
                async move {
                    let name = source.file_name();
                    let task = tokio::task::spawn_blocking(move || {
                        convert_source(&converter, &loader, &source, &output)
                    });

                    match task.await {
                        Ok(Ok((path, confidence))) => {
                            tracing::info!("Converted {} (confidence {:.2})", name, confidence);
                            ConversionEntry::success(name, path.display().to_string(), confidence)
                        }
                        Ok(Err(e)) => {
                            tracing::error!("Failed to convert {}: {:#}", name, e);
                            ConversionEntry::failed(name, format!("{e:#}"))
                        }
                        Err(e) => {
                            tracing::error!("Conversion task for {} panicked: {}", name, e);
                            ConversionEntry::failed(name, e.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        files.extend(collisions);
        files.sort_by(|a, b| a.source.cmp(&b.source));

        let success = files
            .iter()
            .filter(|f| f.status == ConversionStatus::Success)
            .count();
        let summary = ConversionSummary {
            total: files.len(),
            success,
            failed: files.len() - success,
            files,
        };

        write_json(&output.join(SUMMARY_FILE), &summary)?;
        tracing::info!(
            "Conversion finished: {}/{} succeeded",
            summary.success,
            summary.total
        );
        Ok(summary)
    }

    /// Convert one source without writing anything
    pub fn convert_path(&self, path: &Path) -> anyhow::Result<PartialRecord> {
        let source = DocumentLoader::source_for(path)?
            .with_context(|| format!("{} is not a text file or page image directory", path.display()))?;
        load_record(&self.converter, &self.loader, &source)
    }
}

fn load_record(
    converter: &StoryConverter,
    loader: &DocumentLoader,
    source: &StorySource,
) -> anyhow::Result<PartialRecord> {
    let text = loader.load(source)?;
    let file_name = source.file_name();

    let id = DocumentId::parse_or_unknown(&file_name);
    if !id.is_identified() {
        tracing::warn!("Unrecognized file name format: {}", file_name);
    }

    Ok(converter.convert(&RawDocument::new(id, file_name, text)))
}

/// Split off sources whose record name was already claimed by an earlier source.
///
/// Sources arrive sorted, so the first path in walk order keeps the name.
fn claim_output_names(sources: Vec<StorySource>) -> (Vec<StorySource>, Vec<ConversionEntry>) {
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    let mut accepted = Vec::with_capacity(sources.len());
    let mut collisions = Vec::new();

    for source in sources {
        let name = DocumentId::parse_or_unknown(&source.file_name()).record_file_name();
        match claimed.get(&name) {
            Some(first) => {
                tracing::warn!(
                    "Skipping {}: output {} already produced by {}",
                    source.path.display(),
                    name,
                    first.display()
                );
                collisions.push(ConversionEntry::failed(
                    source.file_name(),
                    format!("output {} already produced by {}", name, first.display()),
                ));
            }
            None => {
                claimed.insert(name, source.path.clone());
                accepted.push(source);
            }
        }
    }

    (accepted, collisions)
}

fn convert_source(
    converter: &StoryConverter,
    loader: &DocumentLoader,
    source: &StorySource,
    output: &Path,
) -> anyhow::Result<(PathBuf, f64)> {
    let record = load_record(converter, loader, source)?;
    let target = output.join(record.file_name());
    record.save(&target)?;
    Ok((target, record.metadata.ocr_confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seolhwa_core::{OcrConfig, Origin};
    use seolhwa_extractor::ExtractionRules;
    use seolhwa_ocr::OcrManager;

    fn batch(concurrency: usize) -> BatchConverter {
        BatchConverter::new(
            StoryConverter::new(&ExtractionRules::default()).unwrap(),
            DocumentLoader::new(OcrManager::empty(), &OcrConfig::default()),
            concurrency,
        )
    }

    #[tokio::test]
    async fn test_run_converts_text_sources() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        std::fs::write(
            input.path().join("C_F_001_개와 닭의 원한.txt"),
            "① 개요\n개와 닭이 다툰 이야기\n② 내용\n개가 닭을 쫓았다",
        )
        .unwrap();
        std::fs::write(
            input.path().join("T_F_001_개와 닭의 원한.txt"),
            "구연자 김영희, 할머니, 70세\n개광 독이 싸왓수다",
        )
        .unwrap();

        let summary = batch(2).run(input.path(), output.path(), None).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 2);

        let record =
            PartialRecord::load(&output.path().join("C_F_001_개와 닭의 원한.json")).unwrap();
        assert_eq!(record.category, "동물담");
        assert_eq!(record.origin(), Origin::Content);
        assert!(output.path().join("T_F_001_개와 닭의 원한.json").exists());
        assert!(output.path().join(SUMMARY_FILE).exists());
    }

    #[tokio::test]
    async fn test_run_records_failures_and_limit() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        // Page images with no OCR engine registered
        let pages = input.path().join("C_M_002_영등신");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("p01.png"), b"").unwrap();
        std::fs::write(input.path().join("C_M_001_설문대할망.txt"), "한라산").unwrap();
        std::fs::write(input.path().join("C_M_003_삼승할망.txt"), "삼승할망").unwrap();

        let summary = batch(4)
            .run(input.path(), output.path(), Some(2))
            .await
            .unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);

        let failed = summary
            .files
            .iter()
            .find(|f| f.status == ConversionStatus::Failed)
            .unwrap();
        assert_eq!(failed.source, "C_M_002_영등신");
        assert!(failed.error.as_deref().unwrap().contains("OCR engine not available"));
    }

    #[tokio::test]
    async fn test_same_record_name_in_two_folders_is_not_overwritten() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        for (folder, body) in [("a", "첫째 이야기"), ("b", "둘째 이야기")] {
            let dir = input.path().join(folder);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("C_F_001_개와 닭.txt"), format!("② 내용\n{body}")).unwrap();
        }

        let summary = batch(2).run(input.path(), output.path(), None).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);

        let failed = summary
            .files
            .iter()
            .find(|f| f.status == ConversionStatus::Failed)
            .unwrap();
        assert!(failed.error.as_deref().unwrap().contains("already produced by"));

        let record = PartialRecord::load(&output.path().join("C_F_001_개와 닭.json")).unwrap();
        assert!(record.raw_text().contains("첫째"));
    }

    #[test]
    fn test_convert_path_unknown_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "도깨비").unwrap();

        let record = batch(1).convert_path(&path).unwrap();
        assert_eq!(record.id, "story_U_000");
        assert_eq!(record.title, "notes");
    }

    #[test]
    fn test_convert_path_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "x").unwrap();

        assert!(batch(1).convert_path(&path).is_err());
    }
}
