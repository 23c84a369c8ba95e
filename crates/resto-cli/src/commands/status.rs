use resto_core::remote::{RemoteGateway, Resource};

use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_status(session: &Session) -> Result<(), CliError> {
    let reconciler = session.reconciler().await?;
    let store = reconciler.store();

    println!("Database:   {}", session.db_path.display());
    println!("Schema:     v{}", store.schema_version().await?);
    for stats in store.stats().await? {
        println!("  {:<18} {}", stats.collection.name(), stats.records);
    }

    let config_source = if session.config_path.exists() {
        ""
    } else {
        " (not found, using defaults)"
    };
    println!("Config:     {}{config_source}", session.config_path.display());

    let reachable = reconciler.gateway().probe(Resource::Restaurants).await;
    println!(
        "Server:     {} ({})",
        session.config.api_base_url,
        if reachable { "reachable" } else { "unreachable" }
    );
    println!("App origin: {}", session.config.app_origin);

    let caches = session.cache_worker()?.storage().keys().await?;
    println!("Cache dir:  {}", session.cache_dir.display());
    if caches.is_empty() {
        println!("  no caches installed");
    }
    for name in caches {
        println!("  {name}");
    }
    Ok(())
}
