use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facematch_core::{write_results, CollectionId, IndexingPipeline, SearchPipeline, WriteOutcome};
use facematch_rekognition::RekognitionClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(
    name = "facematch",
    about = "Index portraits into a face collection and search it with query images"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the faces in portrait images, labelled by file name
    Index {
        /// Face collection to index into (created if missing)
        #[arg(long)]
        collection_id: String,
        /// Portrait images
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Search a collection with every face found in query images
    Search {
        /// Face collection to search
        #[arg(long)]
        collection_id: String,
        /// Directory holding the indexed portraits
        #[arg(long)]
        portraits_dir: Option<PathBuf>,
        /// Directory to write result images to
        #[arg(long)]
        results_dir: Option<PathBuf>,
        /// Minimum similarity in percent
        #[arg(long)]
        threshold: Option<f32>,
        /// Query images
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Index {
            collection_id,
            images,
        } => {
            let client = connect(&config)?;
            let mut pipeline =
                IndexingPipeline::new(&client, config.throttle(), config.index_options());
            let summary = pipeline
                .run(&CollectionId::new(collection_id), images.as_slice())
                .context("indexing failed")?;
            println!("Indexed {} faces from {} images", summary.faces, summary.images);
        }
        Commands::Search {
            collection_id,
            portraits_dir,
            results_dir,
            threshold,
            images,
        } => {
            if let Some(dir) = portraits_dir {
                config.portraits_dir = dir;
            }
            if let Some(dir) = results_dir {
                config.results_dir = dir;
            }
            if let Some(threshold) = threshold {
                config.match_threshold = threshold;
            }

            let client = connect(&config)?;
            let mut pipeline =
                SearchPipeline::new(&client, config.throttle(), config.search_options());
            let results = pipeline
                .run(&CollectionId::new(collection_id), images.as_slice())
                .context("search failed")?;

            let outcome = write_results(&results, &config.results_dir)?;
            for line in report(&outcome) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn connect(config: &Config) -> Result<RekognitionClient> {
    RekognitionClient::connect(config.rekognition())
        .context("failed to set up Rekognition client")
}

/// Lines printed once search results are written.
fn report(outcome: &WriteOutcome) -> Vec<String> {
    match outcome {
        WriteOutcome::Written(paths) => paths.iter().map(|p| p.display().to_string()).collect(),
        WriteOutcome::NoFacesFound => {
            vec!["No faces are found in the specified Rekognition face collection.".to_string()]
        }
    }
}
