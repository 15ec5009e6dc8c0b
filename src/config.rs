//! Configuration loading and management for daybrief.
//!
//! Loads settings from `daybrief.toml` with environment variable overrides for sensitive data.
//! Every table is optional: a missing file or section falls back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("invalid validator pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Generative backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// LLM provider, only "gemini" is supported
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Upper bound for the single backend call
    pub timeout_secs: u64,
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 60,
        }
    }
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Batch-wide summarization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Exact number of bullets each generated summary must contain
    pub bullets: usize,
    /// Source text shorter than this is replaced by a title-only instruction in the prompt
    pub min_text_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            bullets: 3,
            min_text_chars: 100,
        }
    }
}

/// How one section is presented to the backend and to the extractive fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SectionProfile {
    /// Heading used for the section listing in the prompt
    pub heading: String,
    /// Bullet emoji rotation; the first one doubles as the default emoji
    pub emojis: Vec<String>,
    /// Character budget of source text per item
    pub char_budget: usize,
    /// Sentences selected by the extractive fallback
    pub fallback_sentences: usize,
    /// Long transcript-like text: excerpt from the middle instead of the head
    pub transcript: bool,
    /// Extra field shown in front of the title, e.g. the podcast name
    pub source_field: Option<String>,
}

impl Default for SectionProfile {
    fn default() -> Self {
        Self {
            heading: "ITEMS".to_string(),
            emojis: vec!["📌".into(), "🔹".into(), "➡️".into()],
            char_budget: 3000,
            fallback_sentences: 3,
            transcript: false,
            source_field: None,
        }
    }
}

impl SectionProfile {
    /// Built-in profile for the known digest sections
    pub fn builtin(section: &str) -> Option<Self> {
        let emojis = |list: &[&str]| list.iter().map(|e| e.to_string()).collect::<Vec<_>>();
        let profile = match section {
            "news" => Self {
                heading: "NEWS ARTICLES".into(),
                emojis: emojis(&["📰", "📊", "🌍"]),
                char_budget: 3000,
                fallback_sentences: 3,
                ..Self::default()
            },
            "ai_security_news" => Self {
                heading: "AI SECURITY NEWS".into(),
                emojis: emojis(&["🛡️", "🔐", "⚠️"]),
                char_budget: 3000,
                fallback_sentences: 3,
                ..Self::default()
            },
            "podcasts" => Self {
                heading: "PODCAST EPISODES".into(),
                emojis: emojis(&["🎙️", "💡", "🎯"]),
                char_budget: 5000,
                fallback_sentences: 4,
                transcript: true,
                source_field: Some("podcast".into()),
            },
            "papers" => Self {
                heading: "RESEARCH PAPERS".into(),
                emojis: emojis(&["🧠", "🔬", "📈"]),
                char_budget: 1500,
                fallback_sentences: 2,
                ..Self::default()
            },
            _ => return None,
        };
        Some(profile)
    }

    /// The emoji used for placeholders and the first bullet
    pub fn default_emoji(&self) -> &str {
        self.emojis.first().map(String::as_str).unwrap_or("📌")
    }
}

/// Validator denylists and thresholds. The lists are plain data so they can
/// be extended from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Minimum characters of a summary
    pub min_chars: usize,
    /// Literal substrings (case-insensitive) that mark leaked boilerplate
    pub boilerplate: Vec<String>,
    /// Regular expressions matching vague or meta-referential filler
    pub vague_patterns: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        let boilerplate = [
            "brought to you by",
            "sponsored by",
            "this episode is sponsored",
            "promo code",
            "subscribe to our",
            "sign up for our newsletter",
            "all rights reserved",
            "enable javascript",
            "accept cookies",
            "click here",
            "read more:",
        ];
        let vague_patterns = [
            r"(?i)\b(the|this)\s+(episode|article|paper|podcast|video|study|story|report|author|authors|host|hosts|guest|speaker)s?\s+(discuss|explore|cover|examine|highlight|delve|talk|touch|dive|look)",
            r"(?i)\bin\s+this\s+(episode|article|paper|podcast|video|study)\b",
            r"(?i)\bsignificant\s+implications\b",
            r"(?i)\b(far|wide)-reaching\s+(implications|consequences)\b",
            r"(?i)\braises?\s+(important\s+|serious\s+)?questions\b",
            r"(?i)\bsheds?\s+light\s+on\b",
            r"(?i)\bit\s+is\s+(important|worth)\s+(to\s+note|noting)\b",
            r"(?i)\bplays?\s+a\s+(crucial|key|vital|pivotal)\s+role\b",
            r"(?i)\bvarious\s+(topics|aspects|issues)\b",
            r"(?i)\bgame[- ]changer\b",
        ];
        Self {
            min_chars: 40,
            boilerplate: boilerplate.iter().map(|s| s.to_string()).collect(),
            vague_patterns: vague_patterns.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory digest files are written to
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./digests"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    /// Per-section overrides; sections not listed use the built-in profiles
    #[serde(default)]
    pub sections: BTreeMap<String, SectionProfile>,
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the default location (daybrief.toml in cwd or home).
    /// Without a config file the defaults apply, still honouring the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.api.gemini_key = Some(key);
            }
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("daybrief.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("daybrief")
            .join("daybrief.toml");
        home_config.exists().then_some(home_config)
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.agent.provider.as_str() {
            "gemini" => self
                .api
                .gemini_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string())),
            other => Err(ConfigError::MissingApiKey(other.to_string())),
        }
    }

    /// Resolve the profile for a section: config override, built-in, or generic.
    pub fn profile(&self, section: &str) -> SectionProfile {
        if let Some(profile) = self.sections.get(section) {
            return profile.clone();
        }
        SectionProfile::builtin(section).unwrap_or_else(|| SectionProfile {
            heading: section.replace('_', " ").to_uppercase(),
            ..SectionProfile::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
model = "gemini-2.5-flash"

[sections.podcasts]
heading = "SHOWS"
emojis = ["🎧"]
char_budget = 800
fallback_sentences = 2
transcript = false

[validator]
min_chars = 25
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.agent.model, "gemini-2.5-flash");
        assert_eq!(config.agent.provider, "gemini");
        assert_eq!(config.agent.timeout_secs, 60);
        assert_eq!(config.summarizer.bullets, 3);
        assert_eq!(config.validator.min_chars, 25);
        assert!(!config.validator.boilerplate.is_empty());

        let podcasts = config.profile("podcasts");
        assert_eq!(podcasts.heading, "SHOWS");
        assert_eq!(podcasts.default_emoji(), "🎧");
        assert!(podcasts.source_field.is_none());

        // Not overridden: built-in profile
        assert_eq!(config.profile("papers").char_budget, 1500);
    }

    #[test]
    fn unknown_section_gets_generic_profile() {
        let profile = Config::default().profile("weekend_reads");
        assert_eq!(profile.heading, "WEEKEND READS");
        assert_eq!(profile.char_budget, 3000);
        assert!(!profile.transcript);
    }

    #[test]
    fn api_key_requires_a_non_empty_key() {
        let mut config = Config::default();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey(p)) if p == "gemini"));

        config.api.gemini_key = Some("  ".into());
        assert!(config.api_key().is_err());

        config.api.gemini_key = Some("secret".into());
        assert_eq!(config.api_key().unwrap(), "secret");

        config.agent.provider = "openai".into();
        assert!(config.api_key().is_err());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nmodel = 1").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
