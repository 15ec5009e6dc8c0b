//! daybrief CLI - daily digest summarisation
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use daybrief::fetch::ArticleFetcher;
use daybrief::pipeline::Mode;
use daybrief::{extractive, prompt, Config, Digest, SectionBatch, Summarizer, Validator, Verdict};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "daybrief")]
#[command(author, version, about = "Batched summarisation for a daily content digest", long_about = None)]
struct Cli {
    /// Config file (defaults to daybrief.toml in cwd or ~/.config/daybrief)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a batch of sections from a JSON file
    Summarise {
        /// JSON object mapping section names to item lists
        batch: PathBuf,
        /// Where to write the digest (defaults to the dated file in the output dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Fetch article text for items that have a link but no text
        #[arg(long)]
        fetch_missing: bool,
        /// Skip the generative backend entirely
        #[arg(long)]
        extractive_only: bool,
    },
    /// Print the prompt that would be sent for a batch
    Prompt {
        batch: PathBuf,
    },
    /// Check one candidate summary against the quality gate
    Validate {
        text: String,
    },
    /// Extractive summary of a text file
    Extract {
        file: PathBuf,
        #[arg(long, default_value_t = 3)]
        sentences: usize,
        /// Title whose terms are emphasised in the ranking
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Summarise {
            batch,
            out,
            fetch_missing,
            extractive_only,
        } => {
            let mut sections = read_batch(&batch)?;

            if fetch_missing {
                let fetcher = ArticleFetcher::new()?;
                fetcher.fill_missing_text(&mut sections).await;
            }

            let output_dir = config.output.path.clone();
            let summarizer = if extractive_only {
                Summarizer::with_backend(config, None)?
            } else {
                Summarizer::new(config)?
            };
            let (summaries, report) = summarizer.summarize_with_report(&sections).await;

            let mode = match report.mode {
                Mode::Generative => "generative".green(),
                Mode::Extractive => "extractive".yellow(),
            };
            println!("Summaries ({}):", mode);
            if let Some(reason) = &report.fallback {
                println!("  {} {}", "fallback:".yellow(), reason);
            }

            for (section, items) in &sections {
                let corrections = report
                    .sections
                    .get(section)
                    .map(|r| r.corrections())
                    .unwrap_or(0);
                println!("\n{} ({} corrected)", section.to_uppercase().bold(), corrections);
                for (item, summary) in items.iter().zip(&summaries[section]) {
                    println!("  {}", item.title.cyan());
                    for bullet in summary.split("<br>") {
                        println!("    {}", bullet.trim());
                    }
                }
            }

            let today = Local::now().date_naive();
            let path = out.unwrap_or_else(|| Digest::default_path(&output_dir, today));
            Digest::assemble(&sections, &summaries, today).write_to(&path)?;
            info!(path = %path.display(), "Digest written");
            println!("\n{} {}", "Written:".green(), path.display());
        }
        Commands::Prompt { batch } => {
            let sections = read_batch(&batch)?;
            println!("{}", prompt::build_prompt(&sections, &config));
        }
        Commands::Validate { text } => {
            let validator = Validator::new(&config.validator)?;
            match validator.check(&text) {
                Verdict::Valid => println!("{}", "valid".green()),
                Verdict::Invalid(reason) => println!("{} {}", "invalid:".red(), reason),
            }
        }
        Commands::Extract {
            file,
            sentences,
            title,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            println!("{}", extractive::summarize(&text, sentences, title.as_deref()));
        }
    }

    Ok(())
}

fn read_batch(path: &Path) -> anyhow::Result<SectionBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid batch file {}", path.display()))
}
