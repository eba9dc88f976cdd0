//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Falcon inventory toolkit CLI
#[derive(Parser, Debug)]
#[command(name = "falconkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides the configuration file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// OAuth2 bearer token obtained elsewhere
    #[arg(long, global = true, env = "FALCON_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe devices matching a filter
    Devices {
        /// FQL filter
        #[arg(long)]
        filter: Option<String>,

        /// Query hidden devices instead
        #[arg(long)]
        hidden: bool,

        /// Only list device ids
        #[arg(long)]
        ids_only: bool,
    },

    /// Collect every page of a query endpoint
    Query {
        /// Endpoint path (e.g. /devices/queries/devices-scroll/v1)
        #[arg(long)]
        path: String,

        /// Pagination protocol of the endpoint
        #[arg(long, default_value = "numbered")]
        style: QueryStyle,

        /// Page size (defaults to the configured limit for the style)
        #[arg(long)]
        limit: Option<u32>,

        /// FQL filter
        #[arg(long)]
        filter: Option<String>,
    },

    /// Fetch records for a list of ids
    Describe {
        /// Endpoint path (e.g. /devices/entities/devices/v2)
        #[arg(long)]
        path: String,

        /// Ids to look up (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// HTTP method; GET sends ids as query parameters, POST in the body
        #[arg(long, default_value = "post")]
        method: HttpMethod,
    },

    /// Print the effective configuration
    Config,
}

/// Pagination protocol selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryStyle {
    /// Numbered offset in the request body, one page at a time
    Numbered,
    /// Numbered offset, pages fetched concurrently
    Parallel,
    /// Token passed as `offset`
    Token,
    /// Token passed as `after`
    After,
}

/// HTTP method for id lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
