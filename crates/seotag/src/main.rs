//! SeoTag CLI - Suggest SEO tags for an image with a local CLIP model.
//!
//! SeoTag scores a categorized tag vocabulary against an image and prints the
//! best matches. Uploaded images are copied into a local upload directory so
//! they can be removed again later.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the CLIP model (once)
//! seotag models download
//!
//! # Suggest tags for an image
//! seotag tag beach.jpg
//!
//! # Top 10 as JSON, without keeping a copy
//! seotag tag beach.jpg --top-k 10 --format json --no-save
//!
//! # Remove a stored upload
//! seotag delete beach.jpg
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// SeoTag - Suggest SEO-friendly tags for images.
#[derive(Parser, Debug)]
#[command(name = "seotag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Suggest tags for an image
    Tag(cli::tag::TagArgs),

    /// Delete a stored upload
    Delete(cli::delete::DeleteArgs),

    /// Inspect or export the tag vocabulary
    Vocabulary(cli::vocabulary::VocabularyArgs),

    /// Manage the CLIP model files (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match seotag_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `seotag config path`."
            );
            seotag_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("SeoTag v{}", seotag_core::VERSION);

    match cli.command {
        Commands::Tag(args) => cli::tag::execute(args, &config).await,
        Commands::Delete(args) => cli::delete::execute(args, &config).await,
        Commands::Vocabulary(args) => cli::vocabulary::execute(args, &config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
