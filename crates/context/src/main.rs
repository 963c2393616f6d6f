//! Citewise query CLI
//!
//! Answers a research question from a previously built index:
//! - Loads the collection written by `ingestion`
//! - Retrieves the top-k passages and assembles provenance-tagged context
//! - Asks the language model for a grounded, structured answer

use citewise_common::{
    config::AppConfig, embeddings::create_embedder, llm::create_language_model, telemetry, VERSION,
};
use citewise_context::{cancel_channel, render::render_sections, ResearchPipeline, SynthesisOptions, Synthesizer};
use citewise_search::{IndexHandle, IndexStore, VectorRetriever};
use clap::Parser;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ask a question about the indexed research papers
#[derive(Parser, Debug)]
#[command(name = "context", version, about, long_about = None)]
struct Args {
    /// Research question; read from stdin when omitted
    #[arg(value_name = "QUESTION")]
    question: Vec<String>,

    /// Print the answer as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file; defaults to config/{default,$APP_ENV,local}
    #[arg(short, long, env = "CITEWISE_CONFIG")]
    config: Option<String>,

    /// Collection to query (overrides index.collection)
    #[arg(long)]
    collection: Option<String>,

    /// Number of passages to retrieve (overrides retrieval.top_k)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

fn read_question() -> anyhow::Result<String> {
    print!("Enter your research question: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    if let Some(collection) = args.collection {
        config.index.collection = collection;
    }
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }
    config.validate()?;

    telemetry::init_tracing(&config.observability);
    telemetry::init_metrics(&config.observability)?;
    info!("Starting Citewise query v{}", VERSION);

    let question = if args.question.is_empty() {
        read_question()?
    } else {
        args.question.join(" ")
    };
    if question.is_empty() {
        eprintln!("No question given.");
        return Ok(ExitCode::from(2));
    }

    let index = match IndexStore::new(&config.index.dir).load(&config.index.collection).await {
        Ok(index) => index,
        Err(e) => {
            error!(error = %e, "Failed to load index");
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let embedder = create_embedder(&config.embedding)?;
    let retriever = VectorRetriever::new(
        Arc::new(IndexHandle::new(index)),
        embedder,
        config.retrieval_timeout(),
    );
    let synthesizer = Synthesizer::new(
        create_language_model(&config.llm)?,
        SynthesisOptions::from(&config.llm),
    );
    let pipeline = ResearchPipeline::new(Arc::new(retriever), synthesizer, config.retrieval.top_k);

    let (cancel, signal) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling query");
            let _ = cancel.send(true);
        }
    });

    match pipeline.run_query_with_cancel(&question, signal).await {
        Ok(answer) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", render_sections(&answer));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, code = ?e.code(), "Query failed");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!(error = %e, code = ?e.code(), "Query failed");
            Err(e.into())
        }
    }
}
