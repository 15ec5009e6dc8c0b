//! Quality gate for generated summaries.
//!
//! A [`Validator`] is built once per run from [`ValidatorConfig`] and then
//! checks each candidate independently. Checks short-circuit: the first
//! failing one decides the verdict.

use crate::config::{ConfigError, ValidatorConfig};
use lazy_static::lazy_static;
use regex::{Regex, RegexSet};
use std::fmt;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("static regex");
    static ref SEGMENT_DELIMITER: Regex =
        Regex::new(r"(?i)<br\s*/?>|\n").expect("static regex");
}

/// Why a candidate summary was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    InsufficientBullets,
    MalformedCasing,
    UrlLeak,
    BoilerplateLeak,
    VagueFiller,
    CutOff,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::TooShort => "too-short-or-empty",
            Rejection::InsufficientBullets => "insufficient-bullet-segmentation",
            Rejection::MalformedCasing => "malformed-casing",
            Rejection::UrlLeak => "raw-url-leak",
            Rejection::BoilerplateLeak => "boilerplate-leak",
            Rejection::VagueFiller => "vague-filler-detected",
            Rejection::CutOff => "cut-off-ending",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn reason(&self) -> Option<Rejection> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid(reason) => Some(*reason),
        }
    }
}

/// Characters that count as emoji for bullet detection and leading-character checks
pub fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF  // pictographs, emoticons, transport, supplemental symbols
        | 0x2600..=0x27BF  // misc symbols, dingbats
        | 0x2B00..=0x2BFF  // arrows, stars
        | 0x2190..=0x21FF  // arrows
        | 0x2300..=0x23FF) // technical (⌚, ⏱)
}

/// Text with HTML tags removed and surrounding whitespace trimmed
fn visible_text(summary: &str) -> String {
    HTML_TAG.replace_all(summary, "").trim().to_string()
}

/// Number of non-empty `<br>`/newline separated segments
fn segment_count(summary: &str) -> usize {
    SEGMENT_DELIMITER
        .split(summary)
        .filter(|segment| !visible_text(segment).is_empty())
        .count()
}

/// Number of emoji that start the tag-free text or follow whitespace
fn leading_emoji_count(visible: &str) -> usize {
    let mut count = 0;
    let mut previous: Option<char> = None;
    for c in visible.chars() {
        if is_emoji(c) && previous.map_or(true, char::is_whitespace) {
            count += 1;
        }
        previous = Some(c);
    }
    count
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | '”' | '’' | ')' | '…' | '%') || c.is_ascii_digit()
}

/// Quality gate over candidate summaries, configured with denylists.
#[derive(Debug, Clone)]
pub struct Validator {
    min_chars: usize,
    boilerplate: Vec<String>,
    vague: RegexSet,
}

impl Validator {
    /// Compile the configured denylists. Fails only on an invalid pattern.
    pub fn new(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            min_chars: config.min_chars,
            boilerplate: config
                .boilerplate
                .iter()
                .map(|marker| marker.to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
            vague: RegexSet::new(&config.vague_patterns)?,
        })
    }

    /// Check one candidate summary. Never panics and never errors.
    pub fn check(&self, summary: &str) -> Verdict {
        let visible = visible_text(summary);

        if visible.chars().count() < self.min_chars {
            return Verdict::Invalid(Rejection::TooShort);
        }

        if self.vague.is_match(&visible) {
            return Verdict::Invalid(Rejection::VagueFiller);
        }

        if segment_count(summary) < 2 && leading_emoji_count(&visible) < 2 {
            return Verdict::Invalid(Rejection::InsufficientBullets);
        }

        if visible.chars().next().is_some_and(char::is_lowercase) {
            return Verdict::Invalid(Rejection::MalformedCasing);
        }

        let lowered = visible.to_lowercase();
        let body = lowered.trim_start_matches(|c: char| {
            is_emoji(c) || c.is_whitespace() || c == '\u{FE0F}'
        });
        if ["http://", "https://", "www."]
            .iter()
            .any(|prefix| body.starts_with(prefix))
        {
            return Verdict::Invalid(Rejection::UrlLeak);
        }

        if self
            .boilerplate
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
        {
            return Verdict::Invalid(Rejection::BoilerplateLeak);
        }

        if !visible.chars().last().is_some_and(is_terminal) {
            return Verdict::Invalid(Rejection::CutOff);
        }

        Verdict::Valid
    }
}

impl Default for Validator {
    fn default() -> Self {
        // The built-in patterns are known to compile
        Self::new(&ValidatorConfig::default()).expect("default validator patterns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(summary: &str) -> Verdict {
        Validator::default().check(summary)
    }

    #[test]
    fn accepts_well_formed_bullets() {
        assert_eq!(
            check("🎯 OpenAI raised $40B in March 2025.<br>📊 Valuation hit $300B."),
            Verdict::Valid
        );
        assert_eq!(
            check("🎙️ <strong>Dario Amodei</strong> expects agents to run 20% of code review by 2026.<br>💡 Anthropic doubled its safety team.<br>🎯 Compute budgets grow 4x per year."),
            Verdict::Valid
        );
    }

    #[test]
    fn rejects_meta_referential_filler() {
        assert_eq!(
            check("the episode discusses AI trends and raises questions"),
            Verdict::Invalid(Rejection::VagueFiller)
        );
        assert_eq!(
            check("📰 Regulators met on Tuesday.<br>📊 The ruling has significant implications for the sector."),
            Verdict::Invalid(Rejection::VagueFiller)
        );
    }

    #[test]
    fn rejects_short_or_empty() {
        assert_eq!(check(""), Verdict::Invalid(Rejection::TooShort));
        assert_eq!(check("<strong>  </strong>"), Verdict::Invalid(Rejection::TooShort));
        assert_eq!(check("📰 Rates cut.<br>📊 Yes."), Verdict::Invalid(Rejection::TooShort));
    }

    #[test]
    fn rejects_unsegmented_text() {
        assert_eq!(
            check("The Federal Reserve lowered its benchmark rate by 25 basis points on Wednesday."),
            Verdict::Invalid(Rejection::InsufficientBullets)
        );
    }

    #[test]
    fn inline_emoji_bullets_count_as_segments() {
        assert_eq!(
            check("📰 The Federal Reserve cut rates by 25 basis points. 📊 Markets rose 1.2%."),
            Verdict::Valid
        );
    }

    #[test]
    fn rejects_lowercase_fragment() {
        assert_eq!(
            check("rates by 25 basis points on Wednesday.<br>Markets rallied on the news."),
            Verdict::Invalid(Rejection::MalformedCasing)
        );
    }

    #[test]
    fn rejects_leading_url() {
        assert_eq!(
            check("https://example.com/article was published today.<br>It covers the Fed."),
            Verdict::Invalid(Rejection::MalformedCasing)
        );
        assert_eq!(
            check("📰 https://example.com/fed-cuts-rates-2025.<br>📊 Rates fell by 25 basis points."),
            Verdict::Invalid(Rejection::UrlLeak)
        );
    }

    #[test]
    fn rejects_sponsor_leaks() {
        assert_eq!(
            check("🎙️ This show is brought to you by Acme VPN.<br>💡 Use it today for 20% off."),
            Verdict::Invalid(Rejection::BoilerplateLeak)
        );
        assert_eq!(
            check("🎙️ Acme VPN is 20% off this month.<br>💡 Enter promo code LEX at checkout."),
            Verdict::Invalid(Rejection::BoilerplateLeak)
        );
    }

    #[test]
    fn ordinary_tech_facts_are_not_boilerplate() {
        assert_eq!(
            check("📰 Developers use code assistants for 40% of commits.<br>📊 Adoption doubled in 2025."),
            Verdict::Valid
        );
    }

    #[test]
    fn emoji_wrapped_in_tags_count_as_bullets() {
        assert_eq!(
            check("<b>📰</b> The Federal Reserve cut rates by 25 basis points. <b>📊</b> Markets rose 1.2%."),
            Verdict::Valid
        );
    }

    #[test]
    fn rejects_cut_off_endings() {
        assert_eq!(
            check("📰 The Federal Reserve cut rates on Wednesday.<br>📊 Analysts now expect a further cut in"),
            Verdict::Invalid(Rejection::CutOff)
        );
    }

    #[test]
    fn trailing_tags_do_not_hide_the_ending() {
        assert_eq!(
            check("📰 The Federal Reserve cut rates on Wednesday.<br>📊 Analysts expect <strong>two more cuts.</strong>"),
            Verdict::Valid
        );
    }

    #[test]
    fn denylists_are_configurable() {
        let mut config = ValidatorConfig::default();
        config.boilerplate.push("Listen on Spotify".into());
        config.vague_patterns.push(r"(?i)\bnotably\b".into());
        let validator = Validator::new(&config).unwrap();

        assert_eq!(
            validator.check("🎙️ Karpathy returns to teaching.<br>💡 Listen on spotify for more."),
            Verdict::Invalid(Rejection::BoilerplateLeak)
        );
        assert_eq!(
            validator.check("🎙️ Notably, Karpathy returns to teaching.<br>💡 He launches a course."),
            Verdict::Invalid(Rejection::VagueFiller)
        );
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let config = ValidatorConfig {
            vague_patterns: vec!["(unclosed".into()],
            ..ValidatorConfig::default()
        };
        assert!(matches!(
            Validator::new(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
