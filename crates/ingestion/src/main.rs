//! Citewise ingestion binary
//!
//! Builds the corpus index for a directory of papers:
//! 1. Loads every PDF and text file
//! 2. Curates overlapping chunks
//! 3. Embeds them and writes `<index.dir>/<collection>.json`

use citewise_common::{config::AppConfig, embeddings::create_embedder, telemetry, VERSION};
use citewise_ingestion::{DirectoryLoader, IngestionProcessor};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Build a searchable index from a directory of research papers
#[derive(Parser, Debug)]
#[command(name = "ingestion", version, about, long_about = None)]
struct Args {
    /// Corpus directory (overrides corpus.data_dir)
    #[arg(value_name = "DIR")]
    corpus: Option<PathBuf>,

    /// Configuration file; defaults to config/{default,$APP_ENV,local}
    #[arg(short, long, env = "CITEWISE_CONFIG")]
    config: Option<String>,

    /// Collection name to write (overrides index.collection)
    #[arg(long)]
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    if let Some(corpus) = args.corpus {
        config.corpus.data_dir = corpus;
    }
    if let Some(collection) = args.collection {
        config.index.collection = collection;
    }
    config.validate()?;

    telemetry::init_tracing(&config.observability);
    telemetry::init_metrics(&config.observability)?;

    info!("Starting Citewise ingestion v{}", VERSION);

    let embedder = create_embedder(&config.embedding)?;
    let loader = Arc::new(DirectoryLoader::new(
        &config.corpus.extensions,
        config.index.embed_concurrency,
    ));
    let processor = IngestionProcessor::from_config(&config, loader, embedder)?;

    match processor.build_index(&config.corpus.data_dir).await {
        Ok((_, summary)) => {
            info!(
                collection = %summary.collection,
                model = %summary.model_id,
                entries = summary.entries,
                windows = summary.curation.total_windows,
                rejected = ?summary.curation.rejected,
                path = ?summary.path,
                "Ingestion finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, code = ?e.code(), "Ingestion failed");
            Err(e.into())
        }
    }
}
