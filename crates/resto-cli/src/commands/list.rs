use resto_core::reconcile::{ReadState, Routed};
use resto_core::{AppState, Filter};

use crate::commands::common::{
    format_restaurant_lines, restaurant_to_list_item, RestaurantListItem, Session,
};
use crate::error::CliError;

pub async fn run_list(
    cuisine: Option<String>,
    neighborhood: Option<String>,
    as_json: bool,
    session: &Session,
) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;

    let Routed {
        records,
        state: read_state,
    } = reconciler.route_restaurants().await?;
    if let ReadState::Offline(error) = &read_state {
        tracing::warn!("Server unreachable and nothing cached locally: {error}");
    }
    state.load_restaurants(records, &read_state);
    state.set_filters(Filter::from(cuisine), Filter::from(neighborhood));
    let restaurants = state.visible_restaurants();

    if as_json {
        let json_items = restaurants
            .iter()
            .map(restaurant_to_list_item)
            .collect::<Vec<RestaurantListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if restaurants.is_empty() {
        println!("No restaurants found.");
        return Ok(());
    }
    for line in format_restaurant_lines(&restaurants) {
        println!("{line}");
    }
    Ok(())
}
