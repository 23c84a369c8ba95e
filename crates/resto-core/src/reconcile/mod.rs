//! Reconciliation engine.
//!
//! Routes reads between the local store and the remote gateway, applies
//! writes locally first, and replays pending writes once the server is
//! reachable again. The engine keeps no state between calls: everything it
//! knows lives in the local store.

mod outcome;
mod sweep;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::db::{LocalStore, StorageResult, StoredRecord};
use crate::error::{Error, Result};
use crate::models::{NewReview, PendingFavorite, PendingReview, Restaurant, Review};
use crate::query::{self, Filter};
use crate::remote::{RemoteGateway, Resource};

pub use outcome::{
    FavoriteOutcome, ReadState, ReviewOutcome, Routed, StartupReport, SweepFailure, SweepKind,
    SweepReport, OFFLINE_NOTICE,
};

/// Local-first access to restaurants and reviews.
pub struct Reconciler<G> {
    store: LocalStore,
    gateway: G,
}

impl<G: RemoteGateway> Reconciler<G> {
    pub const fn new(store: LocalStore, gateway: G) -> Self {
        Self { store, gateway }
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Serve restaurants from the local store, populating it from the
    /// server when empty.
    pub async fn route_restaurants(&self) -> Result<Routed<Restaurant>> {
        let storage_failure = match self.store.get_all::<Restaurant>().await {
            Ok(restaurants) if !restaurants.is_empty() => {
                tracing::debug!("Serving {} restaurants from local store", restaurants.len());
                return Ok(Routed::local(restaurants));
            }
            Ok(_) => None,
            Err(error) => {
                tracing::warn!("Local restaurant read failed, falling back to server: {error}");
                Some(error)
            }
        };

        match self.gateway.list_restaurants().await {
            Ok(restaurants) => {
                tracing::debug!("Fetched {} restaurants from server", restaurants.len());
                self.store_fetched(restaurants.clone()).await;
                Ok(Routed::populated(restaurants))
            }
            Err(transport) => match storage_failure {
                Some(storage) => Err(Error::Unavailable { storage, transport }),
                None => {
                    tracing::warn!("No local restaurants and server unreachable: {transport}");
                    Ok(Routed::offline(transport))
                }
            },
        }
    }

    /// Committed reviews for a restaurant followed by its queued ones.
    ///
    /// Fetches from the server only when the local union is empty.
    pub async fn route_reviews(&self, restaurant_id: i64) -> Result<Routed<Review>> {
        let storage_failure = match self.local_reviews(restaurant_id).await {
            Ok(reviews) if !reviews.is_empty() => return Ok(Routed::local(reviews)),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!("Local review read failed, falling back to server: {error}");
                Some(error)
            }
        };

        match self.gateway.list_reviews(restaurant_id).await {
            Ok(reviews) => {
                tracing::debug!(
                    "Fetched {} reviews for restaurant {restaurant_id}",
                    reviews.len()
                );
                self.store_fetched(reviews.clone()).await;
                Ok(Routed::populated(reviews))
            }
            Err(transport) => match storage_failure {
                Some(storage) => Err(Error::Unavailable { storage, transport }),
                None => Ok(Routed::offline(transport)),
            },
        }
    }

    async fn local_reviews(&self, restaurant_id: i64) -> StorageResult<Vec<Review>> {
        let committed = self.store.get_all::<Review>().await?;
        let pending = self.store.get_all::<PendingReview>().await?;

        Ok(committed
            .into_iter()
            .chain(pending.into_iter().map(|pending| pending.review))
            .filter(|review| review.restaurant_id == restaurant_id)
            .collect())
    }

    /// Cache a server response; a failed write only costs a refetch later.
    async fn store_fetched<T: StoredRecord>(&self, records: Vec<T>) {
        if records.is_empty() {
            return;
        }
        if let Err(error) = self.store.put_all(records).await {
            tracing::warn!("Failed to cache server response locally: {error}");
        }
    }

    /// Cache server-confirmed reviews, but only for restaurants whose server
    /// reviews are already cached; the rest are picked up by the next fetch.
    async fn cache_committed(&self, reviews: Vec<Review>) {
        let populated = match self.store.get_all::<Review>().await {
            Ok(cached) => cached
                .into_iter()
                .map(|review| review.restaurant_id)
                .collect::<HashSet<_>>(),
            Err(error) => {
                tracing::warn!("Committed reviews not cached locally: {error}");
                return;
            }
        };

        let (cacheable, deferred): (Vec<_>, Vec<_>) = reviews
            .into_iter()
            .partition(|review| populated.contains(&review.restaurant_id));
        if !deferred.is_empty() {
            tracing::debug!(
                "Left {} committed review(s) for the next server fetch",
                deferred.len()
            );
        }
        self.store_fetched(cacheable).await;
    }

    /// Set a favorite locally, queue the intent, and push it if the server
    /// is reachable. Transport failures never escape.
    pub async fn post_favorite(
        &self,
        restaurant_id: i64,
        is_favorite: bool,
    ) -> Result<FavoriteOutcome> {
        let mut restaurant = self.restaurant_by_id(restaurant_id).await?;
        restaurant.mark_favorite(is_favorite);
        self.store.put(restaurant.clone()).await?;
        self.store
            .put(PendingFavorite::new(restaurant_id, is_favorite))
            .await?;
        tracing::info!(
            "Marked restaurant {restaurant_id} favorite={is_favorite} ({})",
            restaurant.name
        );

        if !self.gateway.probe(Resource::Restaurants).await {
            tracing::warn!("Favorite for restaurant {restaurant_id} queued: server unreachable");
            return Ok(FavoriteOutcome::Queued(restaurant));
        }

        match self
            .gateway
            .update_favorite(restaurant_id, is_favorite)
            .await
        {
            Ok(_) => {
                if let Err(error) = self.store.delete::<PendingFavorite>(restaurant_id).await {
                    tracing::warn!(
                        "Favorite for restaurant {restaurant_id} synced but still queued: {error}"
                    );
                }
                Ok(FavoriteOutcome::Synced(restaurant))
            }
            Err(error) => {
                tracing::warn!("Favorite for restaurant {restaurant_id} queued: {error}");
                Ok(FavoriteOutcome::Queued(restaurant))
            }
        }
    }

    /// Validate and submit a review, queueing it when the server is down.
    pub async fn post_review(&self, review: NewReview) -> Result<ReviewOutcome> {
        let review = review.validate()?;
        let mut pending = PendingReview::new(review);

        if self.gateway.probe(Resource::Reviews).await {
            match self.gateway.create_review(&pending.to_submission()).await {
                Ok(committed) => {
                    self.cache_committed(vec![committed.clone()]).await;
                    return Ok(ReviewOutcome::Committed(committed));
                }
                Err(error) => tracing::warn!("Review submission failed, queueing: {error}"),
            }
        } else {
            tracing::warn!("Review queued: server unreachable");
        }

        let key = self.store.put(pending.clone()).await?;
        pending.key = Some(key);
        Ok(ReviewOutcome::Queued(pending))
    }

    pub async fn restaurant_by_id(&self, id: i64) -> Result<Restaurant> {
        let routed = self.route_restaurants().await?;
        if let Some(restaurant) = query::find_by_id(&routed.records, id) {
            return Ok(restaurant.clone());
        }
        match routed.state {
            ReadState::Offline(error) => Err(Error::Transport(error)),
            ReadState::LocalHit | ReadState::Populated => Err(Error::NotFound(id.to_string())),
        }
    }

    pub async fn restaurants_by_cuisine(&self, cuisine: &str) -> Result<Vec<Restaurant>> {
        let routed = self.route_restaurants().await?;
        Ok(query::by_cuisine(&routed.records, cuisine))
    }

    pub async fn restaurants_by_neighborhood(&self, neighborhood: &str) -> Result<Vec<Restaurant>> {
        let routed = self.route_restaurants().await?;
        Ok(query::by_neighborhood(&routed.records, neighborhood))
    }

    pub async fn restaurants_by_cuisine_and_neighborhood(
        &self,
        cuisine: &Filter,
        neighborhood: &Filter,
    ) -> Result<Vec<Restaurant>> {
        let routed = self.route_restaurants().await?;
        Ok(query::by_cuisine_and_neighborhood(
            &routed.records,
            cuisine,
            neighborhood,
        ))
    }

    pub async fn neighborhoods(&self) -> Result<Vec<String>> {
        let routed = self.route_restaurants().await?;
        Ok(query::neighborhoods(&routed.records))
    }

    pub async fn cuisines(&self) -> Result<Vec<String>> {
        let routed = self.route_restaurants().await?;
        Ok(query::cuisines(&routed.records))
    }
}
