use resto_core::reconcile::ReviewOutcome;
use resto_core::{AppState, NewReview};

use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_review(review: NewReview, session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;
    let outcome = reconciler.post_review(review).await?;

    match &outcome {
        ReviewOutcome::Committed(review) => match review.id {
            Some(id) => println!("Review posted (id {id})"),
            None => println!("Review posted"),
        },
        ReviewOutcome::Queued(_) => println!("Review saved locally"),
    }
    if let Some(notice) = outcome.notice() {
        println!("{notice}");
    }
    Ok(())
}
