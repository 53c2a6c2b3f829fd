//! The JSON document consumed by the dashboard viewer.
//!
//! Top-level shape is `{ "summary": ..., "data": [...] }`, written wholesale
//! on every run. The summary is either a single object or the per-type
//! breakdown produced by combining two sources.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::record::InfluencerRecord;
use crate::summary::Summary;

/// Either a single summary or the `all`/`regular`/`sales` breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummarySection {
    ByType {
        all: Summary,
        regular: Summary,
        sales: Summary,
    },
    Single(Summary),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    pub summary: SummarySection,
    pub data: Vec<InfluencerRecord>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Document> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading document {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing document {}", path.display()))
    }

    /// Writes the document as pretty-printed JSON, replacing the file wholesale.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing document {}", path.display()))?;
        Ok(())
    }

    /// Folds download results into the records' local thumbnail paths.
    /// Records without a successful download are left untouched.
    pub fn apply_thumbnails(&mut self, results: &HashMap<u64, Option<String>>) {
        for record in &mut self.data {
            if let Some(id) = record.id {
                if let Some(Some(path)) = results.get(&id) {
                    record.local_thumbnail = Some(path.clone());
                }
            }
        }
    }
}

/// Sibling backup path for a document: `data.json` becomes `data_backup.json`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    path.with_file_name(format!("{stem}_backup.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_record(id: u64) -> InfluencerRecord {
        InfluencerRecord {
            id: Some(id),
            thumbnail_url: Some(format!("https://cdn.example.com/{id}.jpg")),
            ..Default::default()
        }
    }

    #[test]
    fn test_roundtrip_single_summary() {
        let path = temp_path("reel_metrics_doc_single.json");
        let document = Document {
            summary: SummarySection::Single(Summary::default()),
            data: vec![sample_record(1)],
        };
        document.save(&path).unwrap();

        let reloaded = Document::load(&path).unwrap();
        assert!(matches!(reloaded.summary, SummarySection::Single(_)));
        assert_eq!(reloaded.data.len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_roundtrip_by_type_summary() {
        let path = temp_path("reel_metrics_doc_by_type.json");
        let document = Document {
            summary: SummarySection::ByType {
                all: Summary::default(),
                regular: Summary::default(),
                sales: Summary::default(),
            },
            data: Vec::new(),
        };
        document.save(&path).unwrap();

        let reloaded = Document::load(&path).unwrap();
        assert!(matches!(reloaded.summary, SummarySection::ByType { .. }));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_apply_thumbnails_skips_failures() {
        let mut document = Document {
            summary: SummarySection::Single(Summary::default()),
            data: vec![sample_record(1), sample_record(2), sample_record(3)],
        };

        let mut results = HashMap::new();
        results.insert(1, Some("thumbnails/1.jpg".to_string()));
        results.insert(2, None); // failed download

        document.apply_thumbnails(&results);

        assert_eq!(
            document.data[0].local_thumbnail.as_deref(),
            Some("thumbnails/1.jpg")
        );
        assert_eq!(document.data[1].local_thumbnail, None);
        assert_eq!(document.data[2].local_thumbnail, None);
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("data.json")),
            PathBuf::from("data_backup.json")
        );
        assert_eq!(
            backup_path(Path::new("out/data_combined.json")),
            PathBuf::from("out/data_combined_backup.json")
        );
    }
}
