//! Data models for resto

mod favorite;
mod lenient;
mod restaurant;
mod review;
mod timestamp;

pub use favorite::PendingFavorite;
pub use restaurant::{
    image_url_for_restaurant, url_for_restaurant, url_for_review_form, LatLng, Restaurant,
};
pub use review::{
    NewReview, PendingReview, Review, ReviewSubmission, MAX_COMMENTS_CHARS, MAX_RATING,
    MIN_RATING,
};
pub use timestamp::Timestamp;
