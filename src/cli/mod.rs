//! CLI module for Sende.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sende - Daily AI News Episodes
///
/// Assembles a daily audio news episode from scraped stories and keeps a
/// vector-searchable archive of everything it has seen.
/// The name "Sende" comes from the Norwegian word for "broadcast."
#[derive(Parser, Debug)]
#[command(name = "sende")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble an episode: collect stories, write scripts, archive
    Run {
        /// Episode date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Use live source integrations instead of stubs
        #[arg(long)]
        live: bool,

        /// Skip story and episode storage
        #[arg(long)]
        no_store: bool,
    },

    /// Synthesize and assemble audio for an existing episode
    Audio {
        /// Episode date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Search the story archive semantically
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show archive contents
    List,
}
