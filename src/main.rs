//! rustpapers - Scientific paper record browser and survey generator
//!
//! Renders structured paper records from a directory of JSON files, indexes
//! them by subject, and generates comparative surveys through an
//! OpenAI-compatible API.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! rustpapers --papers-dir ./Papers show smith2023.json
//! rustpapers survey a.json b.json --llm-key sk-...
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! rustpapers serve --port 3000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rustpapers::{
    config::Config,
    navigation::Navigator,
    render,
    server::{self, AppState},
    store::{filter_by_years, RecordStore},
    survey,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scientific paper record browser and survey generator
#[derive(Parser)]
#[command(name = "rustpapers")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Directory of paper JSON records (overrides the config file)
    #[arg(long, global = true, env = "PAPERS_DIR")]
    papers_dir: Option<PathBuf>,

    /// Config file (default: ./rustpapers.toml or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List record files, optionally filtered by a filename substring
    List {
        /// Case-insensitive filename substring
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// List subject areas
    Subjects,

    /// List the papers filed under a subject area
    Papers {
        /// Subject name, as printed by `subjects`
        subject: String,
    },

    /// Render one record
    Show {
        /// Record id (file name)
        id: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// List titles and publication years
    Catalog {
        /// Only these years (comma-separated, e.g. "2023,2024")
        #[arg(long)]
        years: Option<String>,
    },

    /// Generate a survey from selected records
    Survey {
        /// Record ids (file names)
        ids: Vec<String>,

        /// Select records by exact title (repeatable)
        #[arg(long = "title")]
        titles: Vec<String>,

        /// Select every record from these years when no ids or titles are given
        #[arg(long)]
        years: Option<String>,

        /// LLM API key
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        llm_key: Option<String>,

        /// LLM API base URL (e.g., https://api.openai.com/v1)
        #[arg(long, env = "OPENAI_BASE_URL")]
        llm_base_url: Option<String>,

        /// LLM model name
        #[arg(long)]
        llm_model: Option<String>,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(dir) = cli.papers_dir {
        config.papers_dir = dir;
    }

    let store = RecordStore::open(&config.papers_dir).context("Failed to open papers directory")?;

    match cli.command {
        Commands::List { query } => {
            let ids = Navigator::new(&store).search(&query)?;
            for id in &ids {
                println!("{}", id);
            }
            info!(count = ids.len(), "Listed records");
        }
        Commands::Subjects => {
            let nav = Navigator::new(&store);
            for subject in nav.get_subjects()? {
                let count = nav.get_papers(&subject)?.len();
                println!("{} ({})", subject, count);
            }
        }
        Commands::Papers { subject } => {
            let papers = Navigator::new(&store).get_papers(&subject)?;
            if papers.is_empty() {
                println!("No papers filed under '{}'.", subject);
            }
            for id in papers {
                println!("{}", id);
            }
        }
        Commands::Show { id, format } => {
            let record = store
                .load(&id)
                .with_context(|| format!("Failed to load record {}", id))?;
            let blocks = render::render_with_id(&record, &id);
            match format {
                OutputFormat::Markdown => print!("{}", render::to_markdown(&blocks)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&blocks)?),
            }
        }
        Commands::Catalog { years } => {
            let mut entries = store.catalog()?;
            if let Some(raw) = years {
                entries = filter_by_years(&entries, &server::parse_years(&raw)?);
            }
            for entry in entries {
                let year = entry.year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string());
                println!("{}  {}  ({})", year, entry.title, entry.id);
            }
        }
        Commands::Survey {
            ids,
            titles,
            years,
            llm_key,
            llm_base_url,
            llm_model,
        } => {
            let mut survey_config = config.survey.clone();
            if let Some(key) = llm_key {
                survey_config.api_key = key;
            }
            if let Some(url) = llm_base_url {
                survey_config.base_url = url;
            }
            if let Some(model) = llm_model {
                survey_config.model = model;
            }
            run_survey(&store, &survey_config, ids, titles, years).await?;
        }
        Commands::Serve { port, host } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            println!("Starting server at http://{}:{}", host, port);
            let state = Arc::new(AppState {
                store,
                survey: config.survey,
            });
            server::serve(state, &host, port).await.context("Server error")?;
        }
    }

    Ok(())
}

// ============================================================================
// Survey
// ============================================================================

async fn run_survey(
    store: &RecordStore,
    config: &survey::SurveyConfig,
    ids: Vec<String>,
    titles: Vec<String>,
    years: Option<String>,
) -> Result<()> {
    let catalog = store.catalog()?;

    // Keep first-seen order, drop duplicates
    let mut seen = BTreeSet::new();
    let mut selected: Vec<String> = Vec::new();
    for id in ids {
        if seen.insert(id.clone()) {
            selected.push(id);
        }
    }
    for title in &titles {
        let entry = catalog
            .iter()
            .find(|e| &e.title == title)
            .with_context(|| format!("No paper titled '{}'", title))?;
        if seen.insert(entry.id.clone()) {
            selected.push(entry.id.clone());
        }
    }
    if selected.is_empty() {
        if let Some(raw) = years {
            let by_year = filter_by_years(&catalog, &server::parse_years(&raw)?);
            selected.extend(by_year.into_iter().map(|e| e.id));
        }
    }

    let records = selected
        .iter()
        .map(|id| store.load(id).with_context(|| format!("Failed to load record {}", id)))
        .collect::<Result<Vec<_>>>()?;

    println!(
        "Generating survey from {} papers with {}... this may take a minute",
        records.len(),
        config.model
    );

    let generated = survey::generate_survey(config, &records)
        .await
        .context("Survey generation failed")?;

    println!("\n{}\n", generated.text);
    println!(
        "Token usage: {} prompt + {} completion = {} total",
        generated.usage.prompt_tokens, generated.usage.completion_tokens, generated.usage.total_tokens
    );
    Ok(())
}
