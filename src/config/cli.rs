use clap::Parser;
use std::path::PathBuf;

/// Command-line overrides. Anything left unset keeps the value coming from
/// the environment or the built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "reel-indexer")]
#[command(author, version, about = "Builds movie pages for finished delivery jobs")]
pub struct Cli {
    /// Template directory
    #[arg(long = "templatedir")]
    pub template_dir: Option<PathBuf>,

    /// Result directory
    #[arg(long = "resultdir")]
    pub result_dir: Option<PathBuf>,

    /// Redis server URL
    #[arg(long)]
    pub redis_addr: Option<String>,

    /// Close idle Redis connections after this many seconds
    #[arg(long)]
    pub redis_idle_timeout: Option<u64>,

    /// Maximum number of idle connections in the Redis pool
    #[arg(long)]
    pub redis_max_idle: Option<usize>,

    /// Log filter, e.g. "debug" or "reel_indexer=trace"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Channel announcing job state changes
    #[arg(long)]
    pub jobs_channel: Option<String>,

    /// Channel receiving progress messages
    #[arg(long)]
    pub log_channel: Option<String>,

    /// Scheme and host the movie pages are scraped from
    #[arg(long)]
    pub metadata_base_url: Option<String>,
}
