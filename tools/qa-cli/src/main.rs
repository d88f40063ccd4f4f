use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qa_client::ClientConfig;
use qa_model::{AskResponse, SearchResponse, SemanticSearchResponse, DEFAULT_TOP_K};
use qa_service::{QaService, Snippet, Threshold};

/// Command-line client for the PDF QA backend.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides PDFQA_BACKEND_URL)
    #[arg(long, value_name = "URL", global = true)]
    backend: Option<String>,

    /// Print raw response records as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a PDF and build its index
    Index {
        file: PathBuf,
    },

    /// Keyword search over an indexed document
    Search {
        #[arg(long, value_name = "DB")]
        db: String,
        query: String,
    },

    /// Search by meaning
    Semantic {
        #[arg(long, value_name = "DB")]
        db: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        query: String,
    },

    /// Ask a question about an indexed document
    Ask {
        #[arg(long, value_name = "DB")]
        db: String,
        /// Confidence threshold, snapped to 0.20..=0.70 in 0.05 steps
        #[arg(long)]
        threshold: Option<f32>,
        question: String,
    },

    /// Print the viewer URL for a page, or download the PDF with --out
    Pdf {
        #[arg(long, value_name = "PATH")]
        pdf: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_name = "TERM", default_value = "")]
        highlight: String,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env(cli.backend.as_deref());
    let svc = QaService::connect(config).context("invalid backend configuration")?;
    let backend = svc.backend();

    match cli.command {
        Commands::Index { file } => {
            let resp = backend.index(&file).with_context(|| format!("indexing {} failed", file.display()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&resp)?);
            } else {
                println!("db_path:  {}", resp.db_path);
                println!("pdf_path: {}", resp.pdf_path);
                match resp.lines_indexed {
                    Some(n) => println!("lines:    {n}"),
                    None => println!("lines:    unknown"),
                }
            }
        }
        Commands::Search { db, query } => {
            let results = backend.search(&db, &query).context("search failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&SearchResponse { results })?);
            } else if results.is_empty() {
                println!("no matches");
            } else {
                for hit in &results {
                    let snippet = Snippet::parse(&hit.snippet).to_marked("[", "]");
                    println!("Page {}, Line {}: {}", hit.page, hit.line, snippet);
                }
            }
        }
        Commands::Semantic { db, top_k, query } => {
            let results = backend.semantic_search(&db, &query, top_k).context("semantic search failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&SemanticSearchResponse { results })?);
            } else if results.is_empty() {
                println!("no matches");
            } else {
                for hit in &results {
                    println!("Score {:.3}  Page {}, Line {}", hit.score, hit.page, hit.line);
                    println!("    {}", hit.text);
                }
            }
        }
        Commands::Ask { db, threshold, question } => {
            let threshold = threshold.map(Threshold::new).unwrap_or_default();
            info!(%threshold, "asking");
            let resp: AskResponse = backend.ask(&db, &question, threshold.value()).context("ask failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&resp)?);
            } else {
                println!("{}", resp.answer);
                if !resp.sources.is_empty() {
                    println!();
                    println!("Sources:");
                    for src in &resp.sources {
                        println!("  Page {}, Line {} (score {})", src.page, src.line, src.score);
                    }
                }
            }
        }
        Commands::Pdf { pdf, page, highlight, out } => match out {
            Some(out) => {
                let bytes = backend.fetch_pdf(&pdf).with_context(|| format!("download of {pdf} failed"))?;
                fs::write(&out, &bytes).with_context(|| format!("writing {} failed", out.display()))?;
                if cli.json {
                    println!("{}", serde_json::json!({ "out": out.display().to_string(), "bytes": bytes.len() }));
                } else {
                    println!("wrote {} bytes to {}", bytes.len(), out.display());
                }
            }
            None => {
                let url = svc.links().pdf_url(&pdf, page, &highlight);
                if cli.json {
                    println!("{}", serde_json::json!({ "url": url }));
                } else {
                    println!("{url}");
                }
            }
        },
    }

    Ok(())
}
