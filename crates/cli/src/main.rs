//! CLI entrypoint for talentsift.

use anyhow::Result;
use clap::{Parser, Subcommand};
use talentsift_core::{config::LlmConfig, CatalogStore, RecommendationEngine, TalentsiftConfig};

#[derive(Parser)]
#[command(name = "talentsift")]
#[command(about = "talentsift: hybrid assessment recommendation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend assessments for a query
    Recommend {
        query: String,
        /// Number of results (default taken from the config file)
        #[arg(long)]
        top_n: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show catalog and service status
    Status,
    /// Print a commented default configuration file
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = TalentsiftConfig::load()?;

    match cli.command {
        Commands::Recommend { query, top_n, json } => {
            let engine = RecommendationEngine::open(&config)?;
            let top_n = top_n.unwrap_or(config.retrieval.top_n);
            let results = engine.recommend(&query, top_n).await?;

            if json {
                // Same shape the recommend endpoint serves.
                let payload: Vec<_> = results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "name": r.name,
                            "url": r.url,
                            "test_type": r.test_type,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (i, r) in results.iter().enumerate() {
                    println!(
                        "{}. {} ({} mins) - {}",
                        i + 1,
                        r.name,
                        r.duration,
                        r.test_type.join(", ")
                    );
                }
            }
        }
        Commands::Status => {
            // Catalog-only view; does not pull the embedding model in.
            let store = CatalogStore::load(
                &config.catalog.metadata_path(),
                &config.catalog.vectors_path(),
            )?;
            println!("Catalog items: {}", store.len());
            println!("Vector dimension: {}", store.dimension());
            println!(
                "Completion service: {}",
                if LlmConfig::api_key().is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
        }
        Commands::Config => {
            print!("{}", TalentsiftConfig::generate_default_config());
        }
    }
    Ok(())
}
