//! Dated digest files: each section's items with their summaries attached.

use crate::extractive::NO_SUMMARY;
use crate::item::{SectionBatch, SummaryBatch};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// One summarized item as handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestEntry {
    pub title: String,
    pub summary: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A full day's digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub sections: BTreeMap<String, Vec<DigestEntry>>,
}

impl Digest {
    /// Attach summaries to their items by position
    pub fn assemble(batch: &SectionBatch, summaries: &SummaryBatch, date: NaiveDate) -> Self {
        let sections = batch
            .iter()
            .map(|(section, items)| {
                let section_summaries = summaries.get(section);
                let entries = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| DigestEntry {
                        title: item.title.clone(),
                        summary: section_summaries
                            .and_then(|s| s.get(i))
                            .filter(|s| !s.trim().is_empty())
                            .cloned()
                            .unwrap_or_else(|| NO_SUMMARY.to_string()),
                        extra: item
                            .extra
                            .iter()
                            .filter(|(key, _)| !matches!(key.as_str(), "title" | "summary"))
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect(),
                    })
                    .collect();
                (section.clone(), entries)
            })
            .collect();

        Self {
            date,
            generated_at: Utc::now(),
            sections,
        }
    }

    /// `digest-YYYY-MM-DD.json` inside `dir`
    pub fn default_path(dir: &Path, date: NaiveDate) -> PathBuf {
        dir.join(format!("digest-{}.json", date.format("%Y-%m-%d")))
    }

    /// Write the digest as pretty JSON, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<(), DigestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
