use resto_core::reconcile::{SweepKind, SweepReport};
use resto_core::SyncState;
use serde::Serialize;

use crate::commands::common::{format_sweep_report, Session};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SweepItem {
    pub kind: SweepKind,
    pub skipped: bool,
    pub synced: usize,
    pub failures: Vec<String>,
}

pub fn sweep_to_item(report: &SweepReport) -> SweepItem {
    SweepItem {
        kind: report.kind,
        skipped: report.skipped,
        synced: report.synced,
        failures: report
            .failures
            .iter()
            .map(|failure| failure.error.to_string())
            .collect(),
    }
}

pub async fn run_sync(as_json: bool, session: &Session) -> Result<(), CliError> {
    let reconciler = session.reconciler().await?;
    let report = reconciler.startup().await?;
    let sync_state = SyncState::from_startup(&report);

    if as_json {
        let json_items = vec![sweep_to_item(&report.favorites), sweep_to_item(&report.reviews)];
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    for line in format_sweep_report(&report.favorites)
        .into_iter()
        .chain(format_sweep_report(&report.reviews))
    {
        println!("{line}");
    }
    println!("Sync state: {}", sync_state.label());
    Ok(())
}
