use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resto")]
#[command(about = "Browse and review restaurants, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip replaying queued favorites and reviews before the command runs
    #[arg(long, global = true)]
    pub no_sync: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List restaurants
    #[command(alias = "ls")]
    List {
        /// Only show this cuisine ("all" for every cuisine)
        #[arg(long)]
        cuisine: Option<String>,
        /// Only show this neighborhood ("all" for every neighborhood)
        #[arg(long)]
        neighborhood: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one restaurant in detail
    Show {
        /// Restaurant ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List reviews for a restaurant, pending ones included
    Reviews {
        /// Restaurant ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a restaurant as favorite
    Favorite {
        /// Restaurant ID
        id: i64,
        /// Clear the favorite flag instead
        #[arg(long)]
        off: bool,
    },
    /// Submit a review
    Review {
        /// Restaurant ID
        id: i64,
        /// Reviewer name
        #[arg(long)]
        name: String,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: i64,
        /// Review text
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// List neighborhoods
    Neighborhoods,
    /// List cuisines
    Cuisines,
    /// Replay queued favorites and reviews against the server
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show local store and server status
    Status,
    /// Manage the offline asset cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Serve app assets cache-first on a local port
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080", value_name = "ADDR")]
        bind: String,
    },
    /// Manage client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Precache the app shell
    Install,
    /// Delete stale cache generations
    Activate,
    /// Resolve one request through the cache
    Fetch {
        /// Absolute URL or path relative to the app origin
        url: String,
        /// Write the response body to a file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List caches and their entries
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a config file
    Init {
        /// Remote API base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Origin the app shell is served from
        #[arg(long, value_name = "URL")]
        app_origin: Option<String>,
        /// Reachability probe timeout in milliseconds
        #[arg(long, value_name = "MS")]
        probe_timeout_ms: Option<u64>,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}
