//! Startup sweeps replaying locally pending writes.
//!
//! Each sweep isolates failures per record: a rejected write is recorded in
//! the report and the sweep moves on.

use std::collections::HashSet;

use super::outcome::{StartupReport, SweepFailure, SweepKind, SweepReport};
use super::Reconciler;
use crate::error::Result;
use crate::models::{PendingFavorite, PendingReview, Restaurant, ReviewSubmission};
use crate::remote::{RemoteGateway, Resource};

impl<G: RemoteGateway> Reconciler<G> {
    /// Push every locally modified restaurant, then replay favorite intents
    /// whose restaurant record is not itself dirty.
    pub async fn push_favorites(&self) -> Result<SweepReport> {
        if !self.gateway.probe(Resource::Restaurants).await {
            tracing::info!("Skipping favorite sweep: server unreachable");
            return Ok(SweepReport::skipped(SweepKind::Favorites));
        }

        let restaurants = self.store.get_all::<Restaurant>().await?;
        let queued = self.store.get_all::<PendingFavorite>().await?;
        let queued_ids: HashSet<i64> = queued.iter().map(|intent| intent.restaurant_id).collect();

        let mut report = SweepReport::new(SweepKind::Favorites);
        let mut dirty_ids = HashSet::new();
        let mut acknowledged = Vec::new();

        for restaurant in restaurants.iter().filter(|restaurant| restaurant.is_dirty()) {
            dirty_ids.insert(restaurant.id);
            match self.gateway.update_restaurant(restaurant).await {
                Ok(()) => {
                    report.synced += 1;
                    if queued_ids.contains(&restaurant.id) {
                        acknowledged.push(restaurant.id);
                    }
                }
                Err(error) => {
                    tracing::warn!("Failed to push restaurant {}: {error}", restaurant.id);
                    report.failures.push(SweepFailure {
                        restaurant_id: Some(restaurant.id),
                        error,
                    });
                }
            }
        }

        for intent in queued
            .iter()
            .filter(|intent| !dirty_ids.contains(&intent.restaurant_id))
        {
            match self
                .gateway
                .update_favorite(intent.restaurant_id, intent.is_favorite)
                .await
            {
                Ok(_) => {
                    report.synced += 1;
                    acknowledged.push(intent.restaurant_id);
                }
                Err(error) => {
                    tracing::warn!(
                        "Failed to replay favorite for restaurant {}: {error}",
                        intent.restaurant_id
                    );
                    report.failures.push(SweepFailure {
                        restaurant_id: Some(intent.restaurant_id),
                        error,
                    });
                }
            }
        }

        if !acknowledged.is_empty() {
            self.store
                .delete_many::<PendingFavorite>(acknowledged)
                .await?;
        }

        tracing::info!(
            "Favorite sweep pushed {} record(s), {} failure(s)",
            report.synced,
            report.failures.len()
        );
        Ok(report)
    }

    /// Replay every queued review in one batch; the queue is cleared only
    /// when the server accepts the batch.
    pub async fn post_temp_reviews(&self) -> Result<SweepReport> {
        if !self.gateway.probe(Resource::Reviews).await {
            tracing::info!("Skipping review sweep: server unreachable");
            return Ok(SweepReport::skipped(SweepKind::Reviews));
        }

        let mut report = SweepReport::new(SweepKind::Reviews);
        let pending = self.store.get_all::<PendingReview>().await?;
        if pending.is_empty() {
            return Ok(report);
        }

        let submissions: Vec<ReviewSubmission> =
            pending.iter().map(PendingReview::to_submission).collect();
        match self.gateway.create_reviews(&submissions).await {
            Ok(committed) => {
                // Only the replayed keys; reviews queued meanwhile stay queued.
                let keys = pending.iter().filter_map(|pending| pending.key).collect();
                self.store.delete_many::<PendingReview>(keys).await?;
                self.cache_committed(committed).await;
                report.synced = pending.len();
                tracing::info!("Replayed {} queued review(s)", pending.len());
            }
            Err(error) => {
                tracing::warn!(
                    "Review batch of {} rejected, keeping queue: {error}",
                    pending.len()
                );
                report.failures.push(SweepFailure {
                    restaurant_id: None,
                    error,
                });
            }
        }
        Ok(report)
    }

    /// Run both sweeps concurrently; they touch disjoint collections.
    pub async fn startup(&self) -> Result<StartupReport> {
        let (favorites, reviews) = tokio::join!(self.push_favorites(), self.post_temp_reviews());
        Ok(StartupReport {
            favorites: favorites?,
            reviews: reviews?,
        })
    }
}
