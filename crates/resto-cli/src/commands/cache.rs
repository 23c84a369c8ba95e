use std::path::Path;

use crate::cli::CacheCommands;
use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_cache(command: CacheCommands, session: &Session) -> Result<(), CliError> {
    match command {
        CacheCommands::Install => run_cache_install(session).await,
        CacheCommands::Activate => run_cache_activate(session).await,
        CacheCommands::Fetch { url, output } => {
            run_cache_fetch(&url, output.as_deref(), session).await
        }
        CacheCommands::List => run_cache_list(session).await,
    }
}

pub async fn run_cache_install(session: &Session) -> Result<(), CliError> {
    let worker = session.cache_worker()?;
    let report = worker.install().await?;
    println!(
        "Cached {} asset(s) from {} into '{}'",
        report.assets, session.config.app_origin, report.cache
    );
    Ok(())
}

pub async fn run_cache_activate(session: &Session) -> Result<(), CliError> {
    let worker = session.cache_worker()?;
    let deleted = worker.activate().await?;
    if deleted.is_empty() {
        println!("No stale caches.");
    }
    for name in deleted {
        println!("Deleted {name}");
    }
    Ok(())
}

pub async fn run_cache_fetch(
    url: &str,
    output: Option<&Path>,
    session: &Session,
) -> Result<(), CliError> {
    let worker = session.cache_worker()?;
    let intercepted = worker.intercept(url).await?;
    let response = &intercepted.response;

    println!(
        "{} {} ({} bytes, {})",
        response.status,
        intercepted.served_from.label(),
        response.body.len(),
        response.content_type.as_deref().unwrap_or("unknown type")
    );
    if let Some(path) = output {
        tokio::fs::write(path, &response.body).await?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

pub async fn run_cache_list(session: &Session) -> Result<(), CliError> {
    let worker = session.cache_worker()?;
    let storage = worker.storage();
    let names = storage.keys().await?;
    if names.is_empty() {
        println!("No caches installed.");
        return Ok(());
    }

    for name in names {
        let keys = storage.open(&name).await?.keys().await?;
        let current = if worker.config().is_current(&name) { "" } else { "  (stale)" };
        println!("{name}: {} cached{current}", keys.len());
        for key in keys {
            println!("  /{key}");
        }
    }
    Ok(())
}
