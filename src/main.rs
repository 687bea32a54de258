//! Propsum CLI - property listing rewrites and summaries
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments, rendering results and handling top-level errors.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use propsum::admin::{self, SummaryEntry, SummaryFilter};
use propsum::rewriter::{join_ids, RecordOutcome};
use propsum::{Config, OllamaClient, Property, PropertyId, Rewriter, Storage};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "propsum")]
#[command(author, version, about = "Rewrite property listings and generate summaries with Ollama", long_about = None)]
struct Cli {
    /// Path to a propsum.toml (defaults to ./propsum.toml, then ~/.config/propsum/)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every property's title and description, then summarise it
    Rewrite,
    /// Load properties from a JSON array, replacing records with the same id
    Import {
        /// JSON file with property records
        file: PathBuf,
    },
    /// List stored summaries, most recently updated first
    List {
        /// Only summaries updated on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Only summaries first created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        created_since: Option<NaiveDate>,
    },
    /// Search summaries by property title or summary text
    Search {
        /// Search query
        query: String,
    },
    /// Show one property and its summary
    Show {
        /// Property id
        id: PropertyId,
    },
    /// Delete a property together with its summary
    Delete {
        /// Property id
        id: PropertyId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    let storage = Storage::open(&config.storage.path).with_context(|| {
        format!("failed to open storage at {}", config.storage.path.display())
    })?;

    match cli.command {
        Commands::Rewrite => {
            let client = OllamaClient::new(&config)?;
            println!(
                "Rewriting {} properties with {}...\n",
                storage.count(),
                client.model()
            );

            let report = Rewriter::new(&client, &storage)
                .throttle(config.throttle())
                .run()
                .await?;

            // per-record errors are already on stderr via the log
            for outcome in &report.outcomes {
                match outcome {
                    RecordOutcome::Summarized { id, title } => {
                        println!("  {} {} {}", "✓".green(), id, title);
                    }
                    RecordOutcome::Failed { id, stage, .. } => {
                        println!("  {} {} (failed while {})", "✗".red(), id, stage);
                    }
                }
            }

            let failed = report.failed_ids();
            if !failed.is_empty() {
                println!(
                    "\n{}",
                    format!(
                        "Failed to process the following property IDs: {}",
                        join_ids(&failed)
                    )
                    .yellow()
                );
            }
            println!(
                "\n{}",
                "Successfully re-written properties and generated summaries.".green()
            );
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let properties: Vec<Property> = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;

            for property in &properties {
                storage.put_property(property)?;
            }
            println!("Imported {} properties.", properties.len());
        }
        Commands::List {
            since,
            created_since,
        } => {
            let filter = SummaryFilter {
                created_since: created_since.and_then(start_of_day),
                updated_since: since.and_then(start_of_day),
            };
            let entries = admin::list_entries(&storage, &filter)?;

            if entries.is_empty() {
                println!("No stored summaries found.");
            } else {
                println!("Stored summaries ({}):\n", entries.len());
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
        Commands::Search { query } => {
            let entries = admin::search_entries(&storage, &query)?;

            if entries.is_empty() {
                println!("No results found for: {}", query);
            } else {
                println!("Search results for '{}':\n", query);
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
        Commands::Show { id } => {
            let property = storage
                .get_property(id)?
                .with_context(|| format!("no property with id {}", id))?;

            println!("=== {} ===\n", property.title);
            println!("{}\n", property.description);
            if !property.locations.is_empty() {
                println!("📍 Location: {}", property.location_list());
            }
            if !property.amenities.is_empty() {
                println!("🏷️  Amenities: {}", property.amenity_list());
            }

            match storage.get_summary(id)? {
                Some(summary) => {
                    println!("\n💡 Summary (updated {}):", summary.updated_at.format("%Y-%m-%d %H:%M"));
                    println!("  {}", summary.summary);
                }
                None => println!("\nNo summary generated yet."),
            }
        }
        Commands::Delete { id } => {
            if storage.delete_property(id)? {
                println!("Deleted property {} and its summary.", id);
            } else {
                println!("No property with id {}.", id);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|start| start.and_utc())
}

/// One admin-style row: property, summary excerpt and timestamps
fn print_entry(entry: &SummaryEntry) {
    let excerpt: String = entry.summary.summary.chars().take(120).collect();
    println!(
        "📄 {} [{}] (created {}, updated {})",
        entry,
        entry.property.property_id,
        entry.summary.created_at.format("%Y-%m-%d %H:%M"),
        entry.summary.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("   {}\n", excerpt);
}
