use resto_core::reconcile::{FavoriteOutcome, OFFLINE_NOTICE};
use resto_core::AppState;

use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_favorite(id: i64, off: bool, session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;
    let outcome = reconciler.post_favorite(id, !off).await?;

    let name = &outcome.restaurant().name;
    if off {
        println!("Removed {name} from favorites");
    } else {
        println!("Marked {name} as favorite");
    }
    if let FavoriteOutcome::Queued(_) = outcome {
        println!("{OFFLINE_NOTICE}");
    }
    Ok(())
}
