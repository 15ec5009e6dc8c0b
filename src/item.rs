//! Content items and the section batches that flow through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One piece of summarizable content, as handed over by a fetcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    #[serde(default)]
    pub title: String,
    /// Source text. Empty means "no source text".
    #[serde(default, deserialize_with = "nullable_string")]
    pub raw_text: String,
    /// Section-specific fields (podcast name, link, source...). Only used for
    /// prompt formatting and passed through to the digest untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_text: raw_text.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach a string extra, builder style
    pub fn with_extra(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extra
            .insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Look up a string-valued extra field
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn has_text(&self) -> bool {
        !self.raw_text.trim().is_empty()
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Section name -> ordered items. Item order is significant: summaries are
/// aligned to it by position.
pub type SectionBatch = BTreeMap<String, Vec<ContentItem>>;

/// Section name -> ordered summaries, one per input item.
pub type SummaryBatch = BTreeMap<String, Vec<String>>;

/// Total number of items across all sections
pub fn item_count(batch: &SectionBatch) -> usize {
    batch.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_extras_and_null_text() {
        let json = r#"{
            "podcasts": [
                {"title": "Ep 1", "raw_text": null, "podcast": "Dwarkesh", "link": "https://x"}
            ]
        }"#;
        let batch: SectionBatch = serde_json::from_str(json).unwrap();
        let item = &batch["podcasts"][0];
        assert_eq!(item.title, "Ep 1");
        assert!(!item.has_text());
        assert_eq!(item.extra_str("podcast"), Some("Dwarkesh"));
        assert_eq!(item.extra_str("missing"), None);
    }

    #[test]
    fn missing_raw_text_defaults_to_empty() {
        let item: ContentItem = serde_json::from_str(r#"{"title": "Fed cuts rates"}"#).unwrap();
        assert_eq!(item.raw_text, "");
        assert!(item.extra.is_empty());
    }

    #[test]
    fn counts_items_across_sections() {
        let mut batch = SectionBatch::new();
        batch.insert("news".into(), vec![ContentItem::new("a", ""), ContentItem::new("b", "")]);
        batch.insert("papers".into(), vec![ContentItem::new("c", "")]);
        assert_eq!(item_count(&batch), 3);
    }
}
