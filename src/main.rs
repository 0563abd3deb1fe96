//! docqa CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use docqa::{
    commands::{
        cmd_ask, cmd_ingest, cmd_models, cmd_reset, cmd_status, print_ask_result,
        print_ingest_stats, print_models, print_reset_stats, print_status,
    },
    config::Config,
    error::Result,
    models::{EmbeddingModelKey, LlmModelKey},
    progress::LogWriterFactory,
    session::Session,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version, about = "Ask questions about your own documents", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Embedding model: openai, chroma or nomic
    #[arg(long, global = true)]
    embedding: Option<EmbeddingModelKey>,

    /// Generation model: openai or ollama
    #[arg(long, global = true)]
    llm: Option<LlmModelKey>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk and store PDF or text files
    Ingest {
        /// Files to ingest, processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a question about the ingested documents
    Ask {
        /// The question
        question: String,

        /// Number of passages to retrieve
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// List available embedding and generation models
    Models,

    /// Show session status
    Status,

    /// Forget processed documents for the active embedding model
    Reset,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        error!("{}", e);
        if e.is_fatal() {
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Completions need neither config nor stores
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "docqa", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(key) = cli.embedding {
        config.embedding_model = key;
    }
    if let Some(key) = cli.llm {
        config.llm_model = key;
    }
    if let Commands::Ask {
        top_n: Some(top_n), ..
    } = &cli.command
    {
        config.query.top_n = *top_n;
        config.validate()?;
    }
    debug!(
        "Using {} embeddings and {} generation",
        config.embedding_model, config.llm_model
    );

    match cli.command {
        Commands::Models => {
            let info = cmd_models(&config);
            output(cli.json, &info, print_models)?;
        }

        Commands::Ingest { files } => {
            let mut session = Session::open(&config).await?;
            let stats = cmd_ingest(&mut session, &files).await;
            output(cli.json, &stats, print_ingest_stats)?;
        }

        Commands::Ask { question, .. } => {
            let session = Session::open(&config).await?;
            let result = cmd_ask(&session, &question).await?;
            output(cli.json, &result, print_ask_result)?;
        }

        Commands::Status => {
            let session = Session::open(&config).await?;
            let status = cmd_status(&config, &session).await?;
            output(cli.json, &status, print_status)?;
        }

        Commands::Reset => {
            let mut session = Session::open(&config).await?;
            let stats = cmd_reset(&mut session).await?;
            output(cli.json, &stats, print_reset_stats)?;
        }

        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
}

fn output<T: Serialize>(json: bool, value: &T, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}
