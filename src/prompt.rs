//! Builds the single batched prompt sent to the generative backend.
//!
//! The prompt has three parts: a fixed style rubric, the numbered listing of
//! every item per section with an excerpt of its source text, and the output
//! contract (one JSON array per section, one string per item).

use crate::config::{Config, SectionProfile};
use crate::item::{ContentItem, SectionBatch};

/// Substituted for source text too short to summarize
pub const TITLE_ONLY: &str =
    "[No usable source text. Infer a factual summary from the title alone; do not invent figures.]";

/// Share of a long transcript skipped as presumed intro and sponsor reads
const INTRO_SKIP_PERCENT: usize = 15;

fn rubric(bullets: usize) -> String {
    format!(
        "You are the editor of a daily briefing newsletter. Summarize every item listed below.\n\
\n\
STYLE RULES (apply to every summary):\n\
- Write exactly {bullets} bullets per item. Start each bullet with one relevant emoji and separate bullets with <br>.\n\
- Each bullet is one complete sentence that starts with a capital letter (after the emoji) and ends with a period.\n\
- Be fact-dense: lead with concrete names, numbers, dates, and outcomes. Use <strong> tags for the single most important figure or name per bullet.\n\
- Do not restate or paraphrase the headline; add information the title does not already give.\n\
- Never refer to the source itself: no \"the article\", \"the episode\", \"the paper\", \"this study\", \"the host discusses\".\n\
- No vague filler such as \"raises questions\", \"significant implications\", \"sheds light on\", or \"plays a crucial role\".\n\
- Never include URLs, bylines, cookie notices, or newsletter sign-up text.\n"
    )
}

fn transcript_rules(sections: &[&str]) -> String {
    format!(
        "- For the transcript-based sections ({}): ignore ads, sponsor reads, promo codes, and host introductions; summarize only the substantive discussion.\n",
        sections.join(", ")
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Source text excerpt for one item, bounded by the section's character budget.
pub fn excerpt(item: &ContentItem, profile: &SectionProfile, min_text_chars: usize) -> String {
    let text = collapse_whitespace(&item.raw_text);
    let len = text.chars().count();
    if len < min_text_chars {
        return TITLE_ONLY.to_string();
    }
    if len <= profile.char_budget {
        return text;
    }

    let start = if profile.transcript {
        (len * INTRO_SKIP_PERCENT / 100).min(len - profile.char_budget)
    } else {
        0
    };
    text.chars().skip(start).take(profile.char_budget).collect()
}

/// Item label inside the listing: `Source - Title` when the section has a source field.
fn label(item: &ContentItem, profile: &SectionProfile) -> String {
    let source = profile
        .source_field
        .as_deref()
        .and_then(|field| item.extra_str(field));
    match source {
        Some(source) => format!("{} - {}", source, item.title),
        None => item.title.clone(),
    }
}

fn output_contract(batch: &SectionBatch, bullets: usize) -> String {
    let shape = batch
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(section, items)| {
            format!(
                "  \"{}\": [{} strings, one per item, in listing order]",
                section,
                items.len()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let counts = batch
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(section, items)| format!("\"{}\" must have exactly {}", section, items.len()))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "\nOUTPUT FORMAT:\n\
Return ONLY a JSON object with no markdown formatting or code fences, shaped like this:\n\
{{\n{shape}\n}}\n\
Each string holds the {bullets} emoji bullets for that item joined with <br>, for example:\n\
\"🎯 <strong>OpenAI</strong> raised $40B in March 2025.<br>📊 The round values the company at <strong>$300B</strong>.<br>🏦 SoftBank supplied $30B of the total.\"\n\
HARD REQUIREMENT: every array must contain exactly as many strings as there are items in its section ({counts}). \
Never merge, skip, or reorder items; if an item has no usable text, still return a summary for it in its position.\n"
    )
}

/// Build the prompt for a whole batch. Pure: depends only on the batch and config.
pub fn build_prompt(batch: &SectionBatch, config: &Config) -> String {
    let bullets = config.summarizer.bullets;
    let mut prompt = rubric(bullets);

    let transcript_sections: Vec<&str> = batch
        .iter()
        .filter(|(section, items)| !items.is_empty() && config.profile(section).transcript)
        .map(|(section, _)| section.as_str())
        .collect();
    if !transcript_sections.is_empty() {
        prompt.push_str(&transcript_rules(&transcript_sections));
    }

    for (section, items) in batch.iter().filter(|(_, items)| !items.is_empty()) {
        let profile = config.profile(section);
        prompt.push_str(&format!(
            "\n{} (key \"{}\", {} items):\n",
            profile.heading,
            section,
            items.len()
        ));
        for (i, item) in items.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. [{}]: {}\n",
                i + 1,
                label(item, &profile),
                excerpt(item, &profile, config.summarizer.min_text_chars)
            ));
        }
    }

    prompt.push_str(&output_contract(batch, bullets));
    prompt
}
