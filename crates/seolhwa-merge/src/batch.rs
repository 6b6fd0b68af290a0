//! Directory-level pairing and merging
//!
//! Partial records are discovered by file name (`C_F_001_title.json`,
//! `T_F_001_title.json`), grouped by pair key and merged one pair at a
//! time. A failing pair is logged and counted; the run continues.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use seolhwa_core::record::write_json;
use seolhwa_core::{Category, DocumentId, Origin, PairKey, PartialRecord, Result, SeolhwaError};

use crate::{RecordPair, StoryMerger};

/// Name of the run summary written next to the merged folders
pub const SUMMARY_FILE: &str = "_merge_summary.json";

/// Files found for one pair key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairSlot {
    pub content: Option<PathBuf>,
    pub text: Option<PathBuf>,
}

impl PairSlot {
    fn slot_mut(&mut self, origin: Origin) -> &mut Option<PathBuf> {
        match origin {
            Origin::Text => &mut self.text,
            _ => &mut self.content,
        }
    }
}

/// Partial record files grouped for merging
#[derive(Debug, Clone, Default)]
pub struct PairIndex {
    pub pairs: BTreeMap<PairKey, PairSlot>,
    /// Files whose names do not carry an identity; merged one by one
    pub unidentified: Vec<PathBuf>,
}

impl PairIndex {
    /// Scan `dir` for `*.json` partial records, skipping `_`-prefixed files
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| SeolhwaError::io(dir, e))? {
            let path = entry.map_err(|e| SeolhwaError::io(dir, e))?.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if path.is_file() && name.ends_with(".json") && !name.starts_with('_') {
                files.push((name, path));
            }
        }
        files.sort();

        let mut index = Self::default();
        for (name, path) in files {
            index.insert(&name, path);
        }
        Ok(index)
    }

    /// File a record under its identity; a later file for the same side replaces the earlier one
    pub fn insert(&mut self, file_name: &str, path: PathBuf) {
        let Some(id) = DocumentId::parse(file_name) else {
            tracing::warn!("Unrecognized file name format: {}", file_name);
            self.unidentified.push(path);
            return;
        };

        let key = id.pair_key();
        let slot = self.pairs.entry(key.clone()).or_default().slot_mut(id.origin);
        if let Some(previous) = slot.replace(path) {
            tracing::warn!(
                "Duplicate {} record for {}; replacing {}",
                id.origin,
                key,
                previous.display()
            );
        }
    }

    /// Number of merge units (pairs plus unidentified files)
    pub fn len(&self) -> usize {
        self.pairs.len() + self.unidentified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pair that could not be merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFailure {
    pub key: String,
    pub error: String,
}

/// Run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub paired: usize,
    pub content_only: usize,
    pub text_only: usize,
    pub merged: usize,
    pub errors: usize,
    #[serde(default)]
    pub failures: Vec<MergeFailure>,
}

impl MergeStats {
    fn record_sides(&mut self, content: bool, text: bool) {
        match (content, text) {
            (true, true) => self.paired += 1,
            (true, false) => self.content_only += 1,
            _ => self.text_only += 1,
        }
    }

    fn record_failure(&mut self, key: impl Into<String>, error: &SeolhwaError) {
        let key = key.into();
        tracing::error!("Merge failed [{}]: {}", key, error);
        self.errors += 1;
        self.failures.push(MergeFailure {
            key,
            error: error.to_string(),
        });
    }
}

/// Merges every pair found in an input directory into category folders
pub struct BatchMerger {
    merger: StoryMerger,
}

impl BatchMerger {
    pub fn new(merger: StoryMerger) -> Self {
        Self { merger }
    }

    /// Merge everything under `input` into `output/<folder>/<story_id>.json`
    pub fn run(&self, input: &Path, output: &Path) -> Result<MergeStats> {
        let index = PairIndex::scan(input)?;
        tracing::info!("Found {} story pairs in {}", index.len(), input.display());

        for category in Category::KNOWN {
            let folder = output.join(category.folder());
            std::fs::create_dir_all(&folder).map_err(|e| SeolhwaError::io(&folder, e))?;
        }

        let mut stats = MergeStats::default();

        for (key, slot) in &index.pairs {
            stats.record_sides(slot.content.is_some(), slot.text.is_some());
            match self.merge_slot(key, slot, output) {
                Ok(path) => {
                    stats.merged += 1;
                    tracing::debug!("Merged {} -> {}", key, path.display());
                }
                Err(e) => stats.record_failure(key.to_string(), &e),
            }
        }

        for path in &index.unidentified {
            match self.merge_unidentified(path, output) {
                Ok((origin, target)) => {
                    stats.record_sides(origin != Origin::Text, origin == Origin::Text);
                    stats.merged += 1;
                    tracing::debug!("Merged {} -> {}", path.display(), target.display());
                }
                Err(e) => stats.record_failure(path.display().to_string(), &e),
            }
        }

        let summary = output.join(SUMMARY_FILE);
        write_json(&summary, &stats)?;

        tracing::info!(
            "Merge finished: {} merged ({} paired, {} content only, {} text only), {} errors",
            stats.merged,
            stats.paired,
            stats.content_only,
            stats.text_only,
            stats.errors
        );
        Ok(stats)
    }

    fn merge_slot(&self, key: &PairKey, slot: &PairSlot, output: &Path) -> Result<PathBuf> {
        let content = slot.content.as_deref().map(PartialRecord::load).transpose()?;
        let text = slot.text.as_deref().map(PartialRecord::load).transpose()?;

        let pair = RecordPair::from_options(content.as_ref(), text.as_ref())
            .ok_or_else(|| SeolhwaError::Validation(format!("pair {key} has no records")))?;

        self.write(key, pair, output)
    }

    /// Merge a file without a parsable identity on its own, keyed by its stem
    fn merge_unidentified(&self, path: &Path, output: &Path) -> Result<(Origin, PathBuf)> {
        let record = PartialRecord::load(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = PairKey::new(Category::Unknown, stem);

        let origin = record.origin();
        let pair = match origin {
            Origin::Text => RecordPair::TextOnly(&record),
            _ => RecordPair::ContentOnly(&record),
        };

        Ok((origin, self.write(&key, pair, output)?))
    }

    fn write(&self, key: &PairKey, pair: RecordPair<'_>, output: &Path) -> Result<PathBuf> {
        let merged = self.merger.merge(key, pair);

        let folder = output.join(merged.folder());
        std::fs::create_dir_all(&folder).map_err(|e| SeolhwaError::io(&folder, e))?;

        let target = folder.join(format!("{}.json", merged.id));
        merged.save(&target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_groups_by_pair_key() {
        let mut index = PairIndex::default();
        index.insert("C_F_001_개와 닭.json", PathBuf::from("a"));
        index.insert("T_F_001_개와 닭.json", PathBuf::from("b"));
        index.insert("T_L_002_오백장군.json", PathBuf::from("c"));
        index.insert("X_Q_009_foo.json", PathBuf::from("d"));

        assert_eq!(index.pairs.len(), 2);
        assert_eq!(index.len(), 3);

        let slot = &index.pairs[&PairKey::new(Category::Folktale, "001")];
        assert_eq!(slot.content, Some(PathBuf::from("a")));
        assert_eq!(slot.text, Some(PathBuf::from("b")));

        let slot = &index.pairs[&PairKey::new(Category::Legend, "002")];
        assert!(slot.content.is_none());

        assert_eq!(index.unidentified, vec![PathBuf::from("d")]);
    }

    #[test]
    fn test_duplicate_side_replaced() {
        let mut index = PairIndex::default();
        index.insert("C_F_001_one.json", PathBuf::from("first"));
        index.insert("C_F_001_two.json", PathBuf::from("second"));

        let slot = &index.pairs[&PairKey::new(Category::Folktale, "001")];
        assert_eq!(slot.content, Some(PathBuf::from("second")));
    }

    #[test]
    fn test_web_record_goes_to_content_side() {
        let mut index = PairIndex::default();
        index.insert("W_M_004_영등신.json", PathBuf::from("w"));
        index.insert("T_M_004_영등신.json", PathBuf::from("t"));
        index.insert("W-M-005_칠성.json", PathBuf::from("legacy"));

        let slot = &index.pairs[&PairKey::new(Category::Myth, "004")];
        assert_eq!(slot.content, Some(PathBuf::from("w")));
        assert_eq!(slot.text, Some(PathBuf::from("t")));

        let slot = &index.pairs[&PairKey::new(Category::Myth, "005")];
        assert_eq!(slot.content, Some(PathBuf::from("legacy")));
        assert!(index.unidentified.is_empty());
    }

    #[test]
    fn test_stats_sides() {
        let mut stats = MergeStats::default();
        stats.record_sides(true, true);
        stats.record_sides(true, false);
        stats.record_sides(false, true);
        assert_eq!((stats.paired, stats.content_only, stats.text_only), (1, 1, 1));

        stats.record_failure("F_001", &SeolhwaError::Validation("bad".to_string()));
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.failures[0].key, "F_001");
    }
}
