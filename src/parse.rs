//! Turns backend response text into per-section summary arrays.
//!
//! Stages, each tried only when the previous one failed:
//! 1. strip a markdown code fence, then parse as JSON
//! 2. drop trailing commas before `]`/`}` and parse again
//! 3. per expected section, locate its array by bracket matching and pull
//!    out the quoted strings with a small scanner

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

lazy_static! {
    static ref TRAILING_SEPARATOR: Regex = Regex::new(r",(\s*[\]}])").expect("static regex");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty response")]
    Empty,
    #[error("no section could be recovered from the response")]
    NoSections,
}

/// Section name -> candidate summaries as returned by the backend
pub type ParsedSections = BTreeMap<String, Vec<String>>;

/// Strip markdown code block wrappers (```json ... ``` or ``` ... ```)
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(without_fence) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening line
    let body = match without_fence.find('\n') {
        Some(newline) => &without_fence[newline + 1..],
        None => without_fence.trim_start_matches("json"),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// One array element as a summary string. Bullet lists are joined with `<br>`;
/// anything else becomes an empty (and therefore invalid) candidate.
fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(bullets) => bullets
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("<br>"),
        _ => String::new(),
    }
}

fn from_json(text: &str, sections: &[&str]) -> Option<ParsedSections> {
    let Value::Object(object) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };

    for key in object.keys().filter(|key| !sections.contains(&key.as_str())) {
        debug!(section = %key, "Ignoring unexpected section in response");
    }

    Some(
        sections
            .iter()
            .filter_map(|&section| match object.get(section) {
                Some(Value::Array(items)) => {
                    Some((section.to_string(), items.iter().map(element_text).collect()))
                }
                _ => None,
            })
            .collect(),
    )
}

/// Scanner state for the manual recovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InString,
    Escape,
}

impl ScanState {
    fn next(self, c: char) -> Self {
        match (self, c) {
            (ScanState::Outside, '"') => ScanState::InString,
            (ScanState::Outside, _) => ScanState::Outside,
            (ScanState::InString, '\\') => ScanState::Escape,
            (ScanState::InString, '"') => ScanState::Outside,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Escape, _) => ScanState::InString,
        }
    }
}

/// Body of the array opened after `"section":`, up to its matching `]`.
/// A truncated response yields everything up to the end of the text.
fn find_array_body<'a>(text: &'a str, section: &str) -> Option<&'a str> {
    let opener = Regex::new(&format!(r#""{}"\s*:\s*\["#, regex::escape(section))).ok()?;
    let start = opener.find(text)?.end();
    let rest = &text[start..];

    let mut depth = 1usize;
    let mut state = ScanState::Outside;
    for (i, c) in rest.char_indices() {
        if state == ScanState::Outside {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&rest[..i]);
                    }
                }
                _ => {}
            }
        }
        state = state.next(c);
    }
    Some(rest)
}

fn decode_literal(literal: &str) -> String {
    serde_json::from_str::<String>(literal).unwrap_or_else(|_| {
        // Raw control characters inside the string: undo the common escapes only
        literal[1..literal.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\\\", "\\")
    })
}

/// Every complete element of an array body, in order. Strings nested in an
/// inner array are joined with `<br>` into one element. An unterminated
/// trailing string or inner array is dropped.
fn split_string_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut bullets: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut depth = 0usize;
    let mut state = ScanState::Outside;

    for c in body.chars() {
        let next = state.next(c);
        match (state, next) {
            (ScanState::Outside, ScanState::InString) => {
                literal.clear();
                literal.push(c);
            }
            (ScanState::Outside, _) => match c {
                '[' => {
                    if depth == 0 {
                        bullets.clear();
                    }
                    depth += 1;
                }
                ']' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        items.push(bullets.join("<br>"));
                    }
                }
                _ => {}
            },
            (_, ScanState::Outside) => {
                literal.push(c);
                let text = decode_literal(&literal);
                if depth == 0 {
                    items.push(text);
                } else {
                    bullets.push(text);
                }
            }
            _ => literal.push(c),
        }
        state = next;
    }
    items
}

fn recover_sections(text: &str, sections: &[&str]) -> ParsedSections {
    sections
        .iter()
        .filter_map(|&section| {
            let body = find_array_body(text, section)?;
            Some((section.to_string(), split_string_items(body)))
        })
        .collect()
}

/// Parse the backend response for the expected sections.
pub fn parse_response(text: &str, sections: &[&str]) -> Result<ParsedSections, ParseError> {
    let cleaned = strip_code_fence(text);
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    // Valid JSON without any expected section at the top level still falls
    // through to bracket matching, which finds arrays nested in a wrapper.
    if let Some(parsed) = from_json(cleaned, sections).filter(|p| !p.is_empty()) {
        return Ok(parsed);
    }

    let repaired = TRAILING_SEPARATOR.replace_all(cleaned, "$1");
    if let Some(parsed) = from_json(&repaired, sections).filter(|p| !p.is_empty()) {
        debug!("Response parsed after removing trailing separators");
        return Ok(parsed);
    }

    let recovered = recover_sections(cleaned, sections);
    if recovered.is_empty() {
        return Err(ParseError::NoSections);
    }
    warn!(
        recovered = recovered.len(),
        expected = sections.len(),
        "Response was not valid JSON; recovered sections by bracket matching"
    );
    Ok(recovered)
}
