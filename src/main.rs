use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn};

use livehouse_scraper::connectors;
use livehouse_scraper::dom::{DocumentLoader, HttpLoader};
use livehouse_scraper::error::{Result, ScraperError};
use livehouse_scraper::fetchers::Simple;
use livehouse_scraper::logging::init_logging;
use livehouse_scraper::reconcile::reconcile;
use livehouse_scraper::storage::{InMemoryStorage, Storage};
use livehouse_scraper::types::Live;

#[derive(Parser)]
#[command(name = "livehouse_scraper", version, about = "Live-house schedule scraper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch lives for venues and dump them as JSON.
    Fetch {
        /// Comma-separated venue ids; all venues when omitted.
        #[arg(long, value_delimiter = ',')]
        venues: Vec<String>,
        /// Write the JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch, reconcile against storage and commit, printing change stats.
    Run {
        /// Comma-separated venue ids; all venues when omitted.
        #[arg(long, value_delimiter = ',')]
        venues: Vec<String>,
    },
    /// List every registered venue.
    ListVenues,
}

fn selected(venues: &[String]) -> Result<Vec<Simple>> {
    if venues.is_empty() {
        return Ok(connectors::all());
    }
    venues
        .iter()
        .map(|id| {
            connectors::find(id)
                .ok_or_else(|| ScraperError::Config(format!("unknown venue id: {id}")))
        })
        .collect()
}

async fn fetch_all(configs: &[Simple], loader: Arc<dyn DocumentLoader>) -> Vec<(String, Vec<Live>)> {
    let mut out = Vec::with_capacity(configs.len());
    for cfg in configs {
        info!(venue = %cfg.venue_id, "fetching");
        let result = cfg.fetch(Arc::clone(&loader)).await;
        if let Some(err) = &result.error {
            warn!(venue = %cfg.venue_id, error = %err, "fetch ended early");
        }
        info!(venue = %cfg.venue_id, lives = result.lives.len(), "fetched");
        out.push((cfg.venue_id.clone(), result.lives));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch { venues, out } => {
            let configs = selected(&venues)?;
            let loader: Arc<dyn DocumentLoader> = Arc::new(HttpLoader::new());
            let fetched = fetch_all(&configs, loader).await;
            let lives: Vec<&Live> = fetched.iter().flat_map(|(_, l)| l.iter()).collect();
            let json = serde_json::to_string_pretty(&lives)?;
            match out {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        Command::Run { venues } => {
            let configs = selected(&venues)?;
            let loader: Arc<dyn DocumentLoader> = Arc::new(HttpLoader::new());
            let storage = InMemoryStorage::new();
            for (venue_id, lives) in fetch_all(&configs, loader).await {
                let old = storage.list_lives(&venue_id).await?;
                let plan = reconcile(&lives, &old);
                let stats = storage.commit(plan).await?;
                info!(
                    venue = %venue_id,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    deleted = stats.deleted,
                    new_artists = stats.new_artists,
                    "committed"
                );
                println!(
                    "{venue_id}: +{} ~{} -{} ({} new artists)",
                    stats.inserted, stats.updated, stats.deleted, stats.new_artists
                );
            }
        }
        Command::ListVenues => {
            for cfg in connectors::all() {
                println!(
                    "{}\t{}/{}",
                    cfg.venue_id, cfg.prefecture_name, cfg.area_name
                );
            }
        }
    }
    Ok(())
}
