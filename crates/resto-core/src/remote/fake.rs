//! In-memory gateway double for engine tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GatewayResult, RemoteGateway, Resource};
use crate::error::TransportError;
use crate::models::{Restaurant, Review, ReviewSubmission};

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Probe(Resource),
    ListRestaurants,
    ListReviews(i64),
    CreateReview,
    CreateReviews(usize),
    UpdateFavorite(i64, bool),
    UpdateRestaurant(i64),
}

#[derive(Default)]
struct FakeState {
    online: bool,
    restaurants: Vec<Restaurant>,
    reviews: Vec<Review>,
    submissions: Vec<ReviewSubmission>,
    failing_restaurants: HashSet<i64>,
    reject_writes: bool,
    calls: Vec<Call>,
    next_review_id: i64,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn online(restaurants: Vec<Restaurant>) -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.state.lock().unwrap();
            state.online = true;
            state.restaurants = restaurants;
            state.next_review_id = 100;
        }
        gateway
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        self.state.lock().unwrap().reviews = reviews;
        self
    }

    /// Writes for this restaurant answer HTTP 500.
    pub fn fail_restaurant(&self, id: i64) {
        self.state.lock().unwrap().failing_restaurants.insert(id);
    }

    /// Every write answers HTTP 500 while reads and probes still succeed.
    pub fn reject_writes(&self, reject: bool) {
        self.state.lock().unwrap().reject_writes = reject;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn restaurants(&self) -> Vec<Restaurant> {
        self.state.lock().unwrap().restaurants.clone()
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.state.lock().unwrap().reviews.clone()
    }

    pub fn submissions(&self) -> Vec<ReviewSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }
}

fn unreachable() -> TransportError {
    TransportError::Unreachable("connection refused".to_string())
}

fn server_error() -> TransportError {
    TransportError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

impl FakeState {
    fn check_write(&self, restaurant_id: i64) -> GatewayResult<()> {
        if !self.online {
            return Err(unreachable());
        }
        if self.reject_writes || self.failing_restaurants.contains(&restaurant_id) {
            return Err(server_error());
        }
        Ok(())
    }

    fn commit(&mut self, submission: &ReviewSubmission) -> Review {
        self.submissions.push(submission.clone());
        let mut review = submission.review.clone();
        review.id = Some(self.next_review_id);
        self.next_review_id += 1;
        self.reviews.push(review.clone());
        review
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn probe(&self, resource: Resource) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Probe(resource));
        state.online
    }

    async fn list_restaurants(&self) -> GatewayResult<Vec<Restaurant>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRestaurants);
        if !state.online {
            return Err(unreachable());
        }
        Ok(state.restaurants.clone())
    }

    async fn list_reviews(&self, restaurant_id: i64) -> GatewayResult<Vec<Review>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListReviews(restaurant_id));
        if !state.online {
            return Err(unreachable());
        }
        Ok(state
            .reviews
            .iter()
            .filter(|review| review.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: &ReviewSubmission) -> GatewayResult<Review> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateReview);
        state.check_write(review.review.restaurant_id)?;
        Ok(state.commit(review))
    }

    async fn create_reviews(&self, reviews: &[ReviewSubmission]) -> GatewayResult<Vec<Review>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateReviews(reviews.len()));
        for review in reviews {
            state.check_write(review.review.restaurant_id)?;
        }
        Ok(reviews.iter().map(|review| state.commit(review)).collect())
    }

    async fn update_favorite(
        &self,
        restaurant_id: i64,
        is_favorite: bool,
    ) -> GatewayResult<Restaurant> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::UpdateFavorite(restaurant_id, is_favorite));
        state.check_write(restaurant_id)?;
        let restaurant = state
            .restaurants
            .iter_mut()
            .find(|restaurant| restaurant.id == restaurant_id)
            .ok_or_else(|| TransportError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })?;
        restaurant.is_favorite = is_favorite;
        Ok(restaurant.clone())
    }

    async fn update_restaurant(&self, restaurant: &Restaurant) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateRestaurant(restaurant.id));
        state.check_write(restaurant.id)?;
        if let Some(existing) = state
            .restaurants
            .iter_mut()
            .find(|existing| existing.id == restaurant.id)
        {
            *existing = restaurant.clone();
        }
        Ok(())
    }
}
