//! Restaurant model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::Timestamp;

/// Geographic position of a restaurant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as served by the remote API and cached locally.
///
/// Restaurants are only ever created by the server import; the client
/// mutates `is_favorite` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Stable server-assigned identifier
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string_from_any",
        skip_serializing_if = "Option::is_none"
    )]
    pub photograph: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latlng: LatLng,
    #[serde(default)]
    pub cuisine_type: String,
    /// Day name to opening-hours text
    #[serde(default)]
    pub operating_hours: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient::bool_from_any")]
    pub is_favorite: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Timestamp,
    /// Fields this client does not model, kept so upstream writes lose nothing
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Restaurant {
    /// Whether the record was modified locally after creation and still
    /// needs pushing upstream.
    pub fn is_dirty(&self) -> bool {
        self.updated_at > self.created_at
    }

    /// Set the favorite flag and advance `updated_at` past its prior value.
    pub fn mark_favorite(&mut self, is_favorite: bool) {
        self.is_favorite = is_favorite;
        self.updated_at = Timestamp::now_after(self.updated_at.max(self.created_at));
    }
}

/// Relative page URL for a restaurant's detail view
pub fn url_for_restaurant(restaurant: &Restaurant) -> String {
    format!("./restaurant.html?id={}", restaurant.id)
}

/// Relative page URL for a restaurant's review form
pub fn url_for_review_form(restaurant: &Restaurant) -> String {
    format!("./review.html?id={}", restaurant.id)
}

/// Image path for a restaurant; records without a photograph fall back to the id
pub fn image_url_for_restaurant(restaurant: &Restaurant) -> String {
    match restaurant.photograph.as_deref() {
        Some(photo) => format!("/img/{photo}.jpg"),
        None => format!("/img/{}.jpg", restaurant.id),
    }
}
