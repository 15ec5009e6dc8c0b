//! Extractive summarization (LexRank) and the bullet presentation used when
//! the generative backend is unavailable or produced an unusable summary.
//!
//! Everything in here is deterministic and infallible: empty input yields an
//! empty summary, and presentation always yields a non-empty string.

use crate::config::SectionProfile;
use crate::item::ContentItem;
use lazy_static::lazy_static;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Similarity at or above which two sentences are linked in the graph
const SIMILARITY_THRESHOLD: f64 = 0.1;
const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const EPSILON: f64 = 1e-6;
/// Weight multiplier for terms that also appear in the item title
const TITLE_TERM_BOOST: f64 = 1.5;

/// Presented summaries shorter than this fall back to the title placeholder
const MIN_PRESENTABLE_CHARS: usize = 20;
const MAX_BULLET_CHARS: usize = 280;
pub const NO_SUMMARY: &str = "No summary available.";

/// Abbreviations whose trailing period does not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "vs", "inc", "jr", "sr", "u.s", "e.g", "i.e",
];

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "must", "can", "it",
        "its", "this", "that", "these", "those", "i", "you", "he", "she", "we", "they", "them",
        "his", "her", "our", "their", "what", "which", "who", "when", "where", "why", "how",
        "all", "each", "more", "most", "other", "some", "such", "no", "not", "only", "so",
        "than", "too", "very", "just", "also", "now", "then", "if", "about", "into", "over",
        "after", "before", "said", "says", "there", "here", "up", "out", "me", "my", "your",
    ]
    .into_iter()
    .collect();
}

/// Sentence count by the naive rule: `!`/`?` followed by a space and every `.` split.
fn naive_chunks(text: &str) -> Vec<String> {
    text.replace("! ", ".\n")
        .replace("? ", ".\n")
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split text into sentences on terminal punctuation followed by whitespace,
/// and on line breaks.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);

        if matches!(c, '.' | '!' | '?' | '…') {
            // Closing quotes and brackets belong to the sentence they end
            while let Some(&next) = chars.peek() {
                if matches!(next, '"' | '\'' | '”' | '’' | ')' | ']') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary && !(c == '.' && ends_with_abbreviation(&current)) {
                push_sentence(&mut sentences, &mut current);
            }
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

fn ends_with_abbreviation(sentence: &str) -> bool {
    let last_word = sentence
        .trim_end_matches('.')
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_lowercase();
    ABBREVIATIONS.contains(&last_word.as_str())
}

fn tokenize(sentence: &str) -> Vec<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}

fn cosine(a: &BTreeMap<&str, f64>, b: &BTreeMap<&str, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// LexRank centrality scores, one per sentence. `None` when the sentences
/// carry no usable terms or the iteration does not produce finite scores.
fn lexrank(sentences: &[String], title: Option<&str>) -> Option<Vec<f64>> {
    let n = sentences.len();
    if n == 0 {
        return None;
    }

    let tokens: Vec<Vec<String>> = sentences.iter().map(|s| tokenize(s)).collect();
    if tokens.iter().all(Vec::is_empty) {
        return None;
    }
    let title_terms: HashSet<String> = title.map(tokenize).unwrap_or_default().into_iter().collect();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for sentence in &tokens {
        let unique: HashSet<&str> = sentence.iter().map(String::as_str).collect();
        for term in unique {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    let vectors: Vec<BTreeMap<&str, f64>> = tokens
        .iter()
        .map(|sentence| {
            let mut tf: BTreeMap<&str, f64> = BTreeMap::new();
            for term in sentence {
                *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
            }
            for (term, weight) in tf.iter_mut() {
                let df = document_frequency.get(term).copied().unwrap_or(1) as f64;
                let mut idf = 1.0 + (n as f64 / df).ln();
                if title_terms.contains(*term) {
                    idf *= TITLE_TERM_BOOST;
                }
                *weight *= idf;
            }
            tf
        })
        .collect();

    // Thresholded similarity graph without self-links, rows normalized to
    // transition probabilities. Rows with no links are dangling.
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let similarity = cosine(&vectors[i], &vectors[j]);
                if similarity >= SIMILARITY_THRESHOLD {
                    matrix[i][j] = similarity;
                }
            }
        }
        let degree: f64 = matrix[i].iter().sum();
        if degree > 0.0 {
            for cell in matrix[i].iter_mut() {
                *cell /= degree;
            }
        }
    }
    let dangling: Vec<bool> = matrix
        .iter()
        .map(|row| row.iter().all(|&w| w == 0.0))
        .collect();

    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        let dangling_mass: f64 = (0..n).filter(|&i| dangling[i]).map(|i| scores[i]).sum();
        let next: Vec<f64> = (0..n)
            .map(|j| {
                let incoming: f64 = (0..n).map(|i| matrix[i][j] * scores[i]).sum();
                (1.0 - DAMPING) / n as f64 + DAMPING * (incoming + dangling_mass / n as f64)
            })
            .collect();
        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        scores = next;
        if delta < EPSILON {
            break;
        }
    }

    scores.iter().all(|s| s.is_finite()).then_some(scores)
}

/// Extractive summary of `text` with at most `count` sentences, kept in
/// document order. The title only emphasizes its terms in the ranking.
pub fn summarize(text: &str, count: usize, title: Option<&str>) -> String {
    let text = text.trim();
    if text.is_empty() || count == 0 {
        return String::new();
    }

    let rough = naive_chunks(text);
    if rough.len() <= count {
        return text.to_string();
    }

    let sentences = split_sentences(text);
    if sentences.len() <= count {
        return sentences.join(" ");
    }

    match lexrank(&sentences, title) {
        Some(scores) => {
            let mut ranked: Vec<usize> = (0..sentences.len()).collect();
            ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
            let mut chosen: Vec<usize> = ranked.into_iter().take(count).collect();
            chosen.sort_unstable();
            chosen
                .iter()
                .map(|&i| sentences[i].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }
        None => {
            let head: Vec<&str> = rough.iter().take(count).map(String::as_str).collect();
            format!("{}.", head.join(". "))
        }
    }
}

/// Title-based placeholder used when nothing presentable can be extracted.
pub fn placeholder(title: &str, profile: &SectionProfile) -> String {
    let title = title.trim();
    if title.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        format!("{} {}", profile.default_emoji(), title)
    }
}

fn clip_bullet(sentence: &str) -> String {
    if sentence.chars().count() <= MAX_BULLET_CHARS {
        return sentence.to_string();
    }
    let clipped: String = sentence.chars().take(MAX_BULLET_CHARS).collect();
    let cut = clipped.rfind(char::is_whitespace).unwrap_or(clipped.len());
    format!("{}…", clipped[..cut].trim_end_matches([',', ';', ':', ' ']))
}

/// Summary of one item formatted as emoji-prefixed bullets joined by `<br>`.
///
/// Never empty: falls back to `{emoji} {title}` or [`NO_SUMMARY`].
pub fn present(item: &ContentItem, profile: &SectionProfile) -> String {
    let count = profile.fallback_sentences.max(1);
    let title = Some(item.title.as_str()).filter(|t| !t.trim().is_empty());
    let summary = summarize(&item.raw_text, count, title);

    let bullets: Vec<String> = split_sentences(&summary)
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, sentence)| {
            let emoji = profile
                .emojis
                .get(i % profile.emojis.len().max(1))
                .map(String::as_str)
                .unwrap_or_else(|| profile.default_emoji());
            format!("{} {}", emoji, clip_bullet(sentence))
        })
        .collect();

    let presented = bullets.join("<br>");
    let visible = summary.trim().chars().count();
    if bullets.is_empty() || visible < MIN_PRESENTABLE_CHARS {
        placeholder(&item.title, profile)
    } else {
        presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "The Federal Reserve cut interest rates by a quarter point on Wednesday. \
        Officials said inflation had cooled enough to justify the first rate cut since 2020. \
        Markets rallied after the Federal Reserve announcement, with the S&P 500 up 1.2%. \
        The weather in Washington was mild. \
        Analysts expect the Federal Reserve to cut interest rates again in December if inflation keeps falling. \
        A local bakery opened a second location downtown.";

    #[test]
    fn splits_sentences_on_terminal_punctuation() {
        let sentences = split_sentences("Rates fell 2.5% today. Why? Dr. Smith said \"enough.\" Done");
        assert_eq!(
            sentences,
            vec!["Rates fell 2.5% today.", "Why?", "Dr. Smith said \"enough.\"", "Done"]
        );
    }

    #[test]
    fn empty_text_yields_empty_summary() {
        assert_eq!(summarize("", 3, Some("Title")), "");
        assert_eq!(summarize("   \n ", 3, None), "");
    }

    #[test]
    fn short_text_is_returned_verbatim() {
        let text = "  One sentence here. Another one.  ";
        assert_eq!(summarize(text, 3, None), "One sentence here. Another one.");
    }

    #[test]
    fn picks_central_sentences_in_document_order() {
        let summary = summarize(ARTICLE, 3, Some("Fed cuts rates"));
        let picked = split_sentences(&summary);
        assert_eq!(picked.len(), 3);
        assert!(!summary.contains("bakery"));
        assert!(!summary.contains("weather"));

        let positions: Vec<usize> = picked
            .iter()
            .map(|s| ARTICLE.find(s.as_str()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ranking_is_deterministic() {
        let first = summarize(ARTICLE, 2, None);
        for _ in 0..5 {
            assert_eq!(summarize(ARTICLE, 2, None), first);
        }
    }

    #[test]
    fn stopword_only_text_falls_back_to_leading_chunks() {
        let text = "It is. It was. So it is. It was so. Is it";
        assert_eq!(summarize(text, 2, None), "It is. It was.");
    }

    #[test]
    fn presents_emoji_bullets() {
        let item = ContentItem::new("Fed cuts rates", ARTICLE);
        let profile = SectionProfile::builtin("news").unwrap();
        let presented = present(&item, &profile);
        let bullets: Vec<&str> = presented.split("<br>").collect();
        assert_eq!(bullets.len(), 3);
        assert!(bullets[0].starts_with("📰 "));
        assert!(bullets[1].starts_with("📊 "));
        assert!(bullets[2].starts_with("🌍 "));
    }

    #[test]
    fn presentation_falls_back_to_title_then_placeholder() {
        let profile = SectionProfile::builtin("papers").unwrap();
        let untitled = ContentItem::new("", "");
        assert_eq!(present(&untitled, &profile), NO_SUMMARY);

        let titled = ContentItem::new("Prompt injection at scale", "Too short.");
        assert_eq!(present(&titled, &profile), "🧠 Prompt injection at scale");
    }

    #[test]
    fn long_sentences_are_clipped_at_a_word_boundary() {
        let long = format!("{} end.", "word ".repeat(100));
        let clipped = clip_bullet(&long);
        assert!(clipped.ends_with('…'));
        assert!(clipped.chars().count() <= MAX_BULLET_CHARS + 1);
        assert!(!clipped.contains("  "));
    }
}
