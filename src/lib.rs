//! # daybrief
//!
//! Batched summarization for a daily content digest.
//!
//! ## Features
//!
//! - **One call per run**: every section of the digest goes to the generative backend in a single prompt
//! - **Repair and reconciliation**: malformed responses are repaired, and each section always gets
//!   exactly one validated summary per item, in order
//! - **Extractive fallback**: a deterministic LexRank summarizer covers missing keys, backend
//!   failures and rejected summaries

pub mod backend;
pub mod config;
pub mod digest;
pub mod extractive;
pub mod fetch;
pub mod item;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod validate;

pub use config::Config;
pub use digest::Digest;
pub use item::{ContentItem, SectionBatch, SummaryBatch};
pub use pipeline::Summarizer;
pub use validate::{Validator, Verdict};
