use resto_core::models::{url_for_restaurant, url_for_review_form};
use resto_core::AppState;

use crate::commands::common::{format_timestamp, Session};
use crate::error::CliError;

pub async fn run_show(id: i64, as_json: bool, session: &Session) -> Result<(), CliError> {
    let mut state = AppState::new();
    let reconciler = session.ready(&mut state).await?;
    let restaurant = reconciler.restaurant_by_id(id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&restaurant)?);
        return Ok(());
    }

    let favorite = if restaurant.is_favorite { "  [favorite]" } else { "" };
    println!("{}{favorite}", restaurant.name);
    println!("  Cuisine:      {}", restaurant.cuisine_type);
    println!("  Neighborhood: {}", restaurant.neighborhood);
    println!("  Address:      {}", restaurant.address);
    println!(
        "  Location:     {:.6}, {:.6}",
        restaurant.latlng.lat, restaurant.latlng.lng
    );
    println!(
        "  Updated:      {}",
        format_timestamp(restaurant.updated_at.as_millis())
    );
    if restaurant.is_dirty() {
        println!("  Favorite change not yet sent to the server");
    }
    if !restaurant.operating_hours.is_empty() {
        println!("  Hours:");
        for (day, hours) in &restaurant.operating_hours {
            println!("    {day:<10} {hours}");
        }
    }
    println!("  Page:         {}", url_for_restaurant(&restaurant));
    println!("  Review form:  {}", url_for_review_form(&restaurant));
    Ok(())
}
