//! Makes backend output conform to the batch: one valid summary per input
//! item, in input order.
//!
//! Extra candidates are dropped, missing ones are filled from the extractive
//! summarizer, and any candidate the validator rejects is replaced for that
//! item only. Extractive output is accepted as is.

use crate::config::SectionProfile;
use crate::extractive;
use crate::item::ContentItem;
use crate::validate::{Validator, Verdict};
use tracing::warn;

/// What reconciliation had to correct in one section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionReport {
    /// Candidates dropped because the backend returned too many
    pub truncated: usize,
    /// Trailing items filled because the backend returned too few
    pub padded: usize,
    /// Candidates replaced after failing validation
    pub replaced: usize,
}

impl SectionReport {
    pub fn corrections(&self) -> usize {
        self.truncated + self.padded + self.replaced
    }
}

/// Reconcile one section's candidates against its items.
///
/// `candidates` is `None` when the section was absent from the response.
/// The result always has exactly `items.len()` entries.
pub fn reconcile_section(
    section: &str,
    items: &[ContentItem],
    candidates: Option<Vec<String>>,
    validator: &Validator,
    profile: &SectionProfile,
) -> (Vec<String>, SectionReport) {
    let expected = items.len();
    let mut report = SectionReport::default();

    let mut candidates = candidates.unwrap_or_else(|| {
        if expected > 0 {
            warn!(section, expected, "Section missing from response, using fallback");
        }
        Vec::new()
    });

    let got = candidates.len();
    if got > expected {
        warn!(section, expected, got, "Too many summaries returned, truncating");
        candidates.truncate(expected);
        report.truncated = got - expected;
    } else if got < expected {
        warn!(section, expected, got, "Too few summaries returned, padding with fallback");
        report.padded = expected - got;
    }

    let mut summaries = Vec::with_capacity(expected);
    for (i, item) in items.iter().enumerate() {
        let summary = match candidates.get(i) {
            Some(candidate) => match validator.check(candidate) {
                Verdict::Valid => candidate.clone(),
                Verdict::Invalid(reason) => {
                    warn!(section, title = %item.title, %reason, "Summary rejected, using fallback");
                    report.replaced += 1;
                    extractive::present(item, profile)
                }
            },
            None => extractive::present(item, profile),
        };
        summaries.push(summary);
    }

    (summaries, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_A: &str = "📰 The Fed cut rates by 25 basis points.<br>📊 Markets rose 1.2%.";
    const GOOD_B: &str = "📰 Oil prices fell to $70 a barrel.<br>📊 OPEC kept output flat.";

    fn items() -> Vec<ContentItem> {
        vec![
            ContentItem::new("Fed cuts rates", "The Fed cut rates."),
            ContentItem::new("Oil slides", "Oil fell."),
            ContentItem::new(
                "Chip exports curbed",
                "The Commerce Department restricted exports of advanced AI chips to 40 countries. \
                 Nvidia shares fell 3% after the announcement. \
                 Officials said the rule takes effect in 30 days.",
            ),
        ]
    }

    fn reconcile(candidates: Option<Vec<String>>) -> (Vec<String>, SectionReport) {
        let profile = SectionProfile::builtin("news").unwrap();
        reconcile_section("news", &items(), candidates, &Validator::default(), &profile)
    }

    #[test]
    fn valid_candidates_pass_through() {
        let (summaries, report) = reconcile(Some(vec![
            GOOD_A.into(),
            GOOD_B.into(),
            GOOD_A.into(),
        ]));
        assert_eq!(summaries, vec![GOOD_A, GOOD_B, GOOD_A]);
        assert_eq!(report.corrections(), 0);
    }

    #[test]
    fn pads_missing_tail_from_the_matching_item() {
        let (summaries, report) = reconcile(Some(vec![GOOD_A.into(), GOOD_B.into()]));
        assert_eq!(summaries.len(), 3);
        assert_eq!(&summaries[..2], &[GOOD_A, GOOD_B]);
        assert!(summaries[2].starts_with("📰 The Commerce Department"));
        assert!(summaries[2].contains("Nvidia shares fell 3%"));
        assert_eq!(report.padded, 1);
    }

    #[test]
    fn truncates_extra_candidates() {
        let (summaries, report) = reconcile(Some(vec![
            GOOD_A.into(),
            GOOD_B.into(),
            GOOD_A.into(),
            GOOD_B.into(),
        ]));
        assert_eq!(summaries, vec![GOOD_A, GOOD_B, GOOD_A]);
        assert_eq!(report.truncated, 1);
    }

    #[test]
    fn replaces_only_the_invalid_item() {
        let (summaries, report) = reconcile(Some(vec![
            GOOD_A.into(),
            "the article discusses oil".into(),
            GOOD_B.into(),
        ]));
        assert_eq!(summaries[0], GOOD_A);
        assert_eq!(summaries[1], "📰 Oil slides");
        assert_eq!(summaries[2], GOOD_B);
        assert_eq!(report.replaced, 1);
    }

    #[test]
    fn missing_section_falls_back_entirely() {
        let (summaries, report) = reconcile(None);
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0], "📰 Fed cuts rates");
        assert_eq!(report.padded, 3);
    }

    #[test]
    fn empty_section_stays_empty() {
        let profile = SectionProfile::default();
        let (summaries, report) =
            reconcile_section("papers", &[], Some(vec![GOOD_A.into()]), &Validator::default(), &profile);
        assert!(summaries.is_empty());
        assert_eq!(report.truncated, 1);
    }
}
