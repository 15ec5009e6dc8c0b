//! The summarization pipeline: prompt, one backend call, parse, reconcile.
//!
//! [`Summarizer::summarize_batch`] cannot fail. Without a backend, or when
//! the call or the parse fails, every section goes through the extractive
//! summarizer instead.

use crate::backend::{Backend, BackendError, GeminiBackend};
use crate::config::{Config, ConfigError};
use crate::extractive;
use crate::item::{item_count, SectionBatch, SummaryBatch};
use crate::parse::{parse_response, ParseError};
use crate::prompt::build_prompt;
use crate::reconcile::{reconcile_section, SectionReport};
use crate::validate::Validator;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a run took the all-extractive path
#[derive(Error, Debug)]
pub enum FallbackReason {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("unparseable response: {0}")]
    Parse(#[from] ParseError),
}

/// Which path produced a run's summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generative,
    Extractive,
}

/// Outcome of one run, for logging and display
#[derive(Debug)]
pub struct RunReport {
    pub mode: Mode,
    /// Set when the backend was configured but could not be used
    pub fallback: Option<FallbackReason>,
    pub sections: BTreeMap<String, SectionReport>,
}

impl RunReport {
    fn extractive(fallback: Option<FallbackReason>) -> Self {
        Self {
            mode: Mode::Extractive,
            fallback,
            sections: BTreeMap::new(),
        }
    }
}

pub struct Summarizer {
    config: Config,
    validator: Validator,
    backend: Option<Box<dyn Backend>>,
}

impl Summarizer {
    /// Build from config, using Gemini when an API key is configured.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let backend: Option<Box<dyn Backend>> = match GeminiBackend::from_config(&config) {
            Ok(gemini) => Some(Box::new(gemini)),
            Err(e) => {
                warn!(error = %e, "No generative backend, using extractive fallback");
                None
            }
        };
        Self::with_backend(config, backend)
    }

    /// Build with an explicit backend, or none for the all-extractive path.
    pub fn with_backend(
        config: Config,
        backend: Option<Box<dyn Backend>>,
    ) -> Result<Self, ConfigError> {
        let validator = Validator::new(&config.validator)?;
        Ok(Self {
            config,
            validator,
            backend,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub async fn summarize_batch(&self, batch: &SectionBatch) -> SummaryBatch {
        self.summarize_with_report(batch).await.0
    }

    /// Summarize every section; the output has one summary per item, in order.
    pub async fn summarize_with_report(&self, batch: &SectionBatch) -> (SummaryBatch, RunReport) {
        let Some(backend) = self.backend.as_deref() else {
            return (self.extractive_batch(batch), RunReport::extractive(None));
        };
        if item_count(batch) == 0 {
            debug!("Nothing to summarize");
            return (self.extractive_batch(batch), RunReport::extractive(None));
        }

        match self.generate(backend, batch).await {
            Ok((summaries, sections)) => {
                let report = RunReport {
                    mode: Mode::Generative,
                    fallback: None,
                    sections,
                };
                (summaries, report)
            }
            Err(reason) => {
                warn!(error = %reason, "Generative summarization failed, falling back to extractive summarizer");
                (self.extractive_batch(batch), RunReport::extractive(Some(reason)))
            }
        }
    }

    async fn generate(
        &self,
        backend: &dyn Backend,
        batch: &SectionBatch,
    ) -> Result<(SummaryBatch, BTreeMap<String, SectionReport>), FallbackReason> {
        let prompt = build_prompt(batch, &self.config);
        info!(
            sections = batch.len(),
            items = item_count(batch),
            prompt_chars = prompt.len(),
            "Starting batch summarization"
        );

        let response = backend.generate(&prompt).await?;
        let section_names: Vec<&str> = batch.keys().map(String::as_str).collect();
        let mut parsed = parse_response(&response, &section_names)?;

        let mut summaries = SummaryBatch::new();
        let mut reports = BTreeMap::new();
        for (section, items) in batch {
            let profile = self.config.profile(section);
            let (section_summaries, report) = reconcile_section(
                section,
                items,
                parsed.remove(section),
                &self.validator,
                &profile,
            );
            debug!(section = %section, summaries = section_summaries.len(), corrections = report.corrections(), "Section reconciled");
            summaries.insert(section.clone(), section_summaries);
            reports.insert(section.clone(), report);
        }
        Ok((summaries, reports))
    }

    /// The all-extractive path: every item summarized from its own text.
    pub fn extractive_batch(&self, batch: &SectionBatch) -> SummaryBatch {
        batch
            .iter()
            .map(|(section, items)| {
                let profile = self.config.profile(section);
                let summaries = items
                    .iter()
                    .map(|item| extractive::present(item, &profile))
                    .collect();
                (section.clone(), summaries)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ContentItem;

    #[tokio::test]
    async fn no_backend_is_deterministic() {
        let summarizer = Summarizer::with_backend(Config::default(), None).unwrap();
        let mut batch = SectionBatch::new();
        batch.insert(
            "news".into(),
            vec![
                ContentItem::new("Fed cuts rates", "The Fed cut rates by a quarter point. Inflation cooled to 2.4% in September. Stocks rose. Bond yields fell to 3.9%. Analysts expect another cut."),
                ContentItem::new("", ""),
            ],
        );

        let (first, report) = summarizer.summarize_with_report(&batch).await;
        let second = summarizer.summarize_batch(&batch).await;
        assert_eq!(first, second);
        assert_eq!(report.mode, Mode::Extractive);
        assert!(report.fallback.is_none());
        assert_eq!(first["news"].len(), 2);
        assert_eq!(first["news"][1], extractive::NO_SUMMARY);
    }
}
