use resto_core::AppState;

use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_neighborhoods(session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;
    print_names(&reconciler.neighborhoods().await?, "No neighborhoods found.");
    Ok(())
}

pub async fn run_cuisines(session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;
    print_names(&reconciler.cuisines().await?, "No cuisines found.");
    Ok(())
}

fn print_names(names: &[String], empty_message: &str) {
    if names.is_empty() {
        println!("{empty_message}");
    }
    for name in names {
        println!("{name}");
    }
}
