//! resto CLI - Browse and review restaurants from the terminal
//!
//! Reads come from the local store first; favorites and reviews made while
//! the server is down are queued and replayed on the next run.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use resto_core::NewReview;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::cache::run_cache;
use crate::commands::common::Session;
use crate::commands::config::run_config;
use crate::commands::directory::{run_cuisines, run_neighborhoods};
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::review::run_review;
use crate::commands::reviews::run_reviews;
use crate::commands::serve::run_serve;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "resto=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    let session = if matches!(
        command,
        Commands::Config {
            command: ConfigCommands::Init { .. }
        }
    ) {
        Session::without_config_file(cli.db_path, cli.config, cli.no_sync)?
    } else {
        Session::load(cli.db_path, cli.config, cli.no_sync)?
    };

    match command {
        Commands::List {
            cuisine,
            neighborhood,
            json,
        } => run_list(cuisine, neighborhood, json, &session).await?,
        Commands::Show { id, json } => run_show(id, json, &session).await?,
        Commands::Reviews { id, json } => run_reviews(id, json, &session).await?,
        Commands::Favorite { id, off } => run_favorite(id, off, &session).await?,
        Commands::Review {
            id,
            name,
            rating,
            comments,
        } => {
            let review = NewReview {
                restaurant_id: id,
                name,
                rating,
                comments,
            };
            run_review(review, &session).await?;
        }
        Commands::Neighborhoods => run_neighborhoods(&session).await?,
        Commands::Cuisines => run_cuisines(&session).await?,
        Commands::Sync { json } => run_sync(json, &session).await?,
        Commands::Status => run_status(&session).await?,
        Commands::Cache { command } => run_cache(command, &session).await?,
        Commands::Serve { bind } => run_serve(&bind, &session).await?,
        Commands::Config { command } => run_config(command, &session)?,
    }

    Ok(())
}
