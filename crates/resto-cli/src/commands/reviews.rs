use resto_core::reconcile::ReadState;
use resto_core::AppState;

use crate::commands::common::{format_review_lines, review_to_list_item, ReviewListItem, Session};
use crate::error::CliError;

pub async fn run_reviews(id: i64, as_json: bool, session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;

    let routed = reconciler.route_reviews(id).await?;
    if let ReadState::Offline(error) = &routed.state {
        tracing::warn!("Server unreachable and no reviews cached locally: {error}");
    }
    state.load_reviews(routed.into_records());

    if as_json {
        let json_items = state
            .reviews
            .iter()
            .map(review_to_list_item)
            .collect::<Vec<ReviewListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if state.reviews.is_empty() {
        println!("No reviews yet!");
        return Ok(());
    }
    for line in format_review_lines(&state.reviews) {
        println!("{line}");
    }
    Ok(())
}
