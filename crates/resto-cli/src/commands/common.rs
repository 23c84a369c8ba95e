use std::env;
use std::path::PathBuf;

use chrono::Utc;
use resto_core::cache::{CacheConfig, CacheStorage, CacheWorker, HttpAssetFetcher};
use resto_core::models::{image_url_for_restaurant, url_for_restaurant};
use resto_core::reconcile::{StartupReport, SweepFailure, SweepKind, SweepReport};
use resto_core::{AppState, ClientConfig, HttpGateway, LocalStore, Reconciler, Restaurant, Review};
use serde::Serialize;

use crate::error::CliError;

/// Everything a command needs to reach the store, the server, and the cache.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub cache_dir: PathBuf,
    pub sync_on_start: bool,
}

impl Session {
    pub fn load(
        cli_db_path: Option<PathBuf>,
        cli_config_path: Option<PathBuf>,
        no_sync: bool,
    ) -> Result<Self, CliError> {
        let config_path = resolve_config_path(cli_config_path)?;
        let config = ClientConfig::load_from_path(&config_path)?.with_env_overrides()?;
        Self::with_config(config, config_path, cli_db_path, no_sync)
    }

    /// Session that leaves the config file unread, for commands that rewrite it.
    pub fn without_config_file(
        cli_db_path: Option<PathBuf>,
        cli_config_path: Option<PathBuf>,
        no_sync: bool,
    ) -> Result<Self, CliError> {
        let config_path = resolve_config_path(cli_config_path)?;
        Self::with_config(ClientConfig::default(), config_path, cli_db_path, no_sync)
    }

    fn with_config(
        config: ClientConfig,
        config_path: PathBuf,
        cli_db_path: Option<PathBuf>,
        no_sync: bool,
    ) -> Result<Self, CliError> {
        let db_path = resolve_db_path(cli_db_path, &config)?;
        let cache_dir = resolve_cache_dir(&config)?;

        Ok(Self {
            config,
            config_path,
            db_path,
            cache_dir,
            sync_on_start: !no_sync,
        })
    }

    pub async fn reconciler(&self) -> Result<Reconciler<HttpGateway>, CliError> {
        let store = LocalStore::open_path(&self.db_path).await?;
        let gateway = HttpGateway::from_config(&self.config)?;
        Ok(Reconciler::new(store, gateway))
    }

    /// Open the engine and replay queued writes first, like every page load does.
    pub async fn ready(&self, state: &mut AppState) -> Result<Reconciler<HttpGateway>, CliError> {
        let reconciler = self.reconciler().await?;
        if self.sync_on_start {
            match reconciler.startup().await {
                Ok(report) => {
                    log_startup_report(&report);
                    state.record_startup(&report);
                }
                Err(error) => tracing::warn!("Startup sync failed: {error}"),
            }
        }
        Ok(reconciler)
    }

    pub fn cache_worker(&self) -> Result<CacheWorker<HttpAssetFetcher>, CliError> {
        let fetcher = HttpAssetFetcher::new(self.config.request_timeout())?;
        let storage = CacheStorage::new(&self.cache_dir);
        Ok(CacheWorker::new(
            storage,
            fetcher,
            &self.config.app_origin,
            CacheConfig::default(),
        )?)
    }
}

fn log_startup_report(report: &StartupReport) {
    for sweep in [&report.favorites, &report.reviews] {
        for failure in &sweep.failures {
            tracing::warn!("{}", format_sweep_failure(sweep, failure));
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestaurantListItem {
    pub id: i64,
    pub name: String,
    pub cuisine_type: String,
    pub neighborhood: String,
    pub address: String,
    pub is_favorite: bool,
    pub needs_sync: bool,
    pub url: String,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewListItem {
    pub id: Option<i64>,
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
    pub created_at: i64,
    pub relative_time: String,
    pub pending: bool,
}

pub fn restaurant_to_list_item(restaurant: &Restaurant) -> RestaurantListItem {
    RestaurantListItem {
        id: restaurant.id,
        name: restaurant.name.clone(),
        cuisine_type: restaurant.cuisine_type.clone(),
        neighborhood: restaurant.neighborhood.clone(),
        address: restaurant.address.clone(),
        is_favorite: restaurant.is_favorite,
        needs_sync: restaurant.is_dirty(),
        url: url_for_restaurant(restaurant),
        image: image_url_for_restaurant(restaurant),
    }
}

pub fn review_to_list_item(review: &Review) -> ReviewListItem {
    let now_ms = Utc::now().timestamp_millis();
    ReviewListItem {
        id: review.id,
        restaurant_id: review.restaurant_id,
        name: review.name.clone(),
        rating: review.rating,
        comments: review.comments.clone(),
        created_at: review.created_at.as_millis(),
        relative_time: format_relative_time(review.created_at.as_millis(), now_ms),
        pending: review.id.is_none(),
    }
}

pub fn format_restaurant_lines(restaurants: &[Restaurant]) -> Vec<String> {
    restaurants
        .iter()
        .map(|restaurant| {
            let marker = if restaurant.is_favorite { '*' } else { ' ' };
            let place = format!("{}, {}", restaurant.cuisine_type, restaurant.neighborhood);
            format!(
                "{:>4} {marker} {:<32}  {place}",
                restaurant.id, restaurant.name
            )
        })
        .collect()
}

pub fn format_review_lines(reviews: &[Review]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    let mut lines = Vec::new();
    for review in reviews {
        let relative_time = format_relative_time(review.created_at.as_millis(), now_ms);
        let pending = if review.id.is_none() { "  (pending)" } else { "" };
        lines.push(format!(
            "{}  {}  {relative_time}{pending}",
            format_rating(review.rating),
            review.name
        ));
        if !review.comments.is_empty() {
            lines.push(format!("    {}", review.comments));
        }
    }
    lines
}

pub fn format_rating(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_sweep_report(report: &SweepReport) -> Vec<String> {
    let label = sweep_label(report);
    if report.skipped {
        return vec![format!("{label}: skipped, server unreachable")];
    }

    let mut lines = vec![format!(
        "{label}: {} synced, {} failed",
        report.synced,
        report.failures.len()
    )];
    lines.extend(
        report
            .failures
            .iter()
            .map(|failure| format!("  {}", format_sweep_failure(report, failure))),
    );
    lines
}

fn format_sweep_failure(report: &SweepReport, failure: &SweepFailure) -> String {
    match failure.restaurant_id {
        Some(id) => format!("{} for restaurant {id}: {}", sweep_label(report), failure.error),
        None => format!("{}: {}", sweep_label(report), failure.error),
    }
}

const fn sweep_label(report: &SweepReport) -> &'static str {
    match report.kind {
        SweepKind::Favorites => "Favorites",
        SweepKind::Reviews => "Reviews",
    }
}

/// Config file location: flag, then `RESTO_CONFIG`, then the platform config dir.
pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_config_path.or_else(|| env::var_os("RESTO_CONFIG").map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_config_path(),
    }
}

/// Database location: flag, then `RESTO_DB_PATH` or the config file, then the data dir.
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &ClientConfig,
) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| config.db_path.clone()) {
        Some(path) => Ok(path),
        None => Ok(data_dir()?.join("resto.db")),
    }
}

pub fn resolve_cache_dir(config: &ClientConfig) -> Result<PathBuf, CliError> {
    match &config.cache_dir {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join("cache")),
    }
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("resto").join("config.json"))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

fn data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("resto"))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}
