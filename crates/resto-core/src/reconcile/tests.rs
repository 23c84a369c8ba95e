use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::models::{PendingFavorite, PendingReview, Timestamp};
use crate::remote::fake::{Call, FakeGateway};

fn restaurant(id: i64, cuisine: &str, neighborhood: &str) -> Restaurant {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Restaurant {id}"),
        "cuisine_type": cuisine,
        "neighborhood": neighborhood,
        "createdAt": 1_504_095_567_183_i64,
        "updatedAt": 1_504_095_567_183_i64,
    }))
    .unwrap()
}

fn catalog() -> Vec<Restaurant> {
    vec![
        restaurant(1, "Asian", "Manhattan"),
        restaurant(2, "Pizza", "Brooklyn"),
        restaurant(3, "American", "Brooklyn"),
    ]
}

fn form(restaurant_id: i64, name: &str, rating: i64) -> NewReview {
    NewReview {
        restaurant_id,
        name: name.to_string(),
        rating,
        comments: "Would come back.".to_string(),
    }
}

fn engine(gateway: FakeGateway) -> Reconciler<FakeGateway> {
    Reconciler::new(LocalStore::open_in_memory().unwrap(), gateway)
}

/// Engine whose local store already holds `restaurants`, with a gateway
/// that starts offline.
async fn seeded_offline(restaurants: Vec<Restaurant>) -> Reconciler<FakeGateway> {
    let engine = engine(FakeGateway::offline());
    engine.store().put_all(restaurants).await.unwrap();
    engine
}

fn server_review(id: i64, restaurant_id: i64, name: &str) -> Review {
    Review {
        id: Some(id),
        restaurant_id,
        name: name.to_string(),
        rating: 4,
        comments: "Mission Chinese Food has grown up".to_string(),
        created_at: Timestamp::from_millis(1_504_095_567_183),
        updated_at: None,
    }
}

fn names(reviews: &[Review]) -> Vec<&str> {
    reviews.iter().map(|review| review.name.as_str()).collect()
}

fn ids(restaurants: &[Restaurant]) -> Vec<i64> {
    restaurants.iter().map(|restaurant| restaurant.id).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_store_is_populated_from_server() {
    let engine = engine(FakeGateway::online(vec![restaurant(1, "Asian", "Manhattan")]));

    let routed = engine.route_restaurants().await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(ids(&routed.records), vec![1]);

    let stored: Vec<Restaurant> = engine.store().get_all().await.unwrap();
    assert_eq!(stored, routed.records);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_route_is_served_locally_without_network() {
    let engine = engine(FakeGateway::online(catalog()));

    let first = engine.route_restaurants().await.unwrap();
    let second = engine.route_restaurants().await.unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(second.state, ReadState::LocalHit);
    assert_eq!(
        engine.gateway().count(|call| *call == Call::ListRestaurants),
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_empty_read_is_distinguishable_from_empty_server() {
    let offline = engine(FakeGateway::offline());
    let routed = offline.route_restaurants().await.unwrap();
    assert!(routed.is_offline());
    assert!(routed.records.is_empty());

    let empty_server = engine(FakeGateway::online(Vec::new()));
    let routed = empty_server.route_restaurants().await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert!(routed.records.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_falls_through_to_server() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("resto.db");
    let store = LocalStore::open_path(&path).await.unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute(
            "INSERT INTO restaurants (key, record) VALUES (1, 'not json')",
            [],
        )
        .unwrap();

    let engine = Reconciler::new(store, FakeGateway::online(catalog()));
    let routed = engine.route_restaurants().await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(ids(&routed.records), vec![1, 2, 3]);

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute(
            "INSERT INTO restaurants (key, record) VALUES (9, 'still not json')",
            [],
        )
        .unwrap();
    engine.gateway().set_online(false);
    let error = engine.route_restaurants().await.unwrap_err();
    assert!(matches!(error, Error::Unavailable { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_while_offline_is_stored_and_queued() {
    let engine = seeded_offline(catalog()).await;
    let before: Restaurant = engine.store().get(2).await.unwrap().unwrap();

    let outcome = engine.post_favorite(2, true).await.unwrap();
    assert!(!outcome.is_synced());

    let after: Restaurant = engine.store().get(2).await.unwrap().unwrap();
    assert!(after.is_favorite);
    assert!(after.updated_at > before.created_at);
    assert!(after.updated_at > before.updated_at);
    assert_eq!(outcome.restaurant(), &after);

    let queued: Vec<PendingFavorite> = engine.store().get_all().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].restaurant_id, 2);
    assert!(queued[0].is_favorite);
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_while_online_is_pushed_and_dequeued() {
    let engine = engine(FakeGateway::online(catalog()));

    let outcome = engine.post_favorite(3, true).await.unwrap();
    assert!(outcome.is_synced());
    assert!(engine
        .gateway()
        .calls()
        .contains(&Call::UpdateFavorite(3, true)));
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 0);
    assert!(engine.gateway().restaurants()[2].is_favorite);
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_synced_even_when_dequeue_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("resto.db");
    let store = LocalStore::open_path(&path).await.unwrap();
    store.put_all(catalog()).await.unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER keep_pending BEFORE DELETE ON pending_favorites
             BEGIN SELECT RAISE(ABORT, 'locked'); END;",
        )
        .unwrap();

    let engine = Reconciler::new(store, FakeGateway::online(catalog()));
    let outcome = engine.post_favorite(2, true).await.unwrap();
    assert!(outcome.is_synced());
    assert!(engine
        .gateway()
        .calls()
        .contains(&Call::UpdateFavorite(2, true)));
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_rejected_by_server_stays_queued() {
    let engine = engine(FakeGateway::online(catalog()));
    engine.gateway().reject_writes(true);

    let outcome = engine.post_favorite(1, true).await.unwrap();
    assert!(matches!(outcome, FavoriteOutcome::Queued(_)));
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_for_unknown_restaurant_is_not_found() {
    let engine = seeded_offline(catalog()).await;
    let error = engine.post_favorite(42, true).await.unwrap_err();
    assert!(matches!(error, Error::NotFound(_)));
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn review_while_offline_is_queued_and_visible() {
    let engine = seeded_offline(catalog()).await;

    let outcome = engine.post_review(form(2, "Ana", 4)).await.unwrap();
    assert!(outcome.notice().is_some());
    let ReviewOutcome::Queued(pending) = outcome else {
        panic!("expected queued review");
    };
    assert!(pending.key.is_some());
    assert_eq!(pending.review.id, None);

    let queued: Vec<PendingReview> = engine.store().get_all().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].review.id, None);

    let routed = engine.route_reviews(2).await.unwrap();
    assert_eq!(routed.state, ReadState::LocalHit);
    assert_eq!(routed.records.len(), 1);
    assert_eq!(routed.records[0].name, "Ana");
    assert_eq!(routed.records[0].id, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn review_while_online_is_committed_with_server_id() {
    let engine = engine(FakeGateway::online(catalog()));

    let outcome = engine.post_review(form(1, "Bo", 5)).await.unwrap();
    let ReviewOutcome::Committed(committed) = outcome else {
        panic!("expected committed review");
    };
    assert!(committed.id.is_some());
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 0);

    let routed = engine.route_reviews(1).await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(routed.records, vec![committed]);
    assert!(engine.gateway().submissions()[0].idempotency_key.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn online_review_does_not_hide_existing_server_reviews() {
    let engine = engine(
        FakeGateway::online(catalog()).with_reviews(vec![server_review(1, 1, "Existing")]),
    );

    engine.post_review(form(1, "Mine", 5)).await.unwrap();
    assert_eq!(engine.store().count::<Review>().await.unwrap(), 0);

    let routed = engine.route_reviews(1).await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(names(&routed.records), vec!["Existing", "Mine"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn online_review_joins_already_cached_server_reviews() {
    let engine = engine(
        FakeGateway::online(catalog()).with_reviews(vec![server_review(1, 1, "Existing")]),
    );
    engine.route_reviews(1).await.unwrap();

    engine.post_review(form(1, "Mine", 5)).await.unwrap();

    let routed = engine.route_reviews(1).await.unwrap();
    assert_eq!(routed.state, ReadState::LocalHit);
    assert_eq!(names(&routed.records), vec!["Existing", "Mine"]);
    assert_eq!(engine.gateway().count(|call| *call == Call::ListReviews(1)), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_review_is_rejected_before_any_io() {
    let engine = engine(FakeGateway::online(catalog()));

    let error = engine.post_review(form(1, "Bo", 9)).await.unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
    assert!(engine.gateway().calls().is_empty());
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn merged_reviews_list_committed_before_pending() {
    let engine = engine(
        FakeGateway::online(catalog()).with_reviews(vec![server_review(1, 1, "Server")]),
    );
    engine.route_reviews(1).await.unwrap();
    engine.post_review(form(1, "Committed", 4)).await.unwrap();
    engine.gateway().set_online(false);
    engine.post_review(form(1, "Queued", 3)).await.unwrap();
    engine.post_review(form(2, "Elsewhere", 3)).await.unwrap();

    let routed = engine.route_reviews(1).await.unwrap();
    assert_eq!(names(&routed.records), vec!["Server", "Committed", "Queued"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_review_view_is_fetched_and_stored() {
    let server_review = server_review(7, 3, "Steve");
    let engine = engine(FakeGateway::online(catalog()).with_reviews(vec![server_review.clone()]));

    let routed = engine.route_reviews(3).await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(routed.records, vec![server_review.clone()]);

    let stored: Vec<Review> = engine.store().get_all().await.unwrap();
    assert_eq!(stored, vec![server_review]);
    assert_eq!(engine.gateway().reviews().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn push_favorites_only_puts_dirty_records() {
    let mut epoch_dirty = restaurant(1, "Asian", "Manhattan");
    epoch_dirty.updated_at = Timestamp::from_millis(epoch_dirty.created_at.as_millis() + 1);
    let iso_dirty: Restaurant = serde_json::from_value(json!({
        "id": 2,
        "name": "Emily",
        "createdAt": 1_504_095_567_183_i64,
        "updatedAt": "2018-06-20T21:12:05.921Z",
    }))
    .unwrap();
    let iso_clean: Restaurant = serde_json::from_value(json!({
        "id": 3,
        "name": "Kang Ho Dong Baekjeong",
        "createdAt": "2017-08-30T12:19:27.183Z",
        "updatedAt": "2017-08-30T12:19:27.183Z",
    }))
    .unwrap();
    let clean = restaurant(4, "Pizza", "Brooklyn");

    let engine = engine(FakeGateway::online(Vec::new()));
    engine
        .store()
        .put_all(vec![epoch_dirty, iso_dirty, iso_clean, clean])
        .await
        .unwrap();

    let report = engine.push_favorites().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.synced, 2);

    let pushed: Vec<Call> = engine
        .gateway()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::UpdateRestaurant(_)))
        .collect();
    assert_eq!(
        pushed,
        vec![Call::UpdateRestaurant(1), Call::UpdateRestaurant(2)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn push_favorites_continues_past_failures() {
    let engine = seeded_offline(catalog()).await;
    engine.post_favorite(1, true).await.unwrap();
    engine.post_favorite(2, true).await.unwrap();
    engine.gateway().set_online(true);
    engine.gateway().fail_restaurant(1);

    let report = engine.push_favorites().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].restaurant_id, Some(1));

    let queued: Vec<PendingFavorite> = engine.store().get_all().await.unwrap();
    assert_eq!(
        queued.iter().map(|intent| intent.restaurant_id).collect::<Vec<_>>(),
        vec![1]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn push_favorites_replays_queue_for_clean_records() {
    let engine = seeded_offline(catalog()).await;
    engine
        .store()
        .put(PendingFavorite::new(3, false))
        .await
        .unwrap();
    engine.gateway().set_online(true);

    let report = engine.push_favorites().await.unwrap();
    assert_eq!(report.synced, 1);
    assert!(engine
        .gateway()
        .calls()
        .contains(&Call::UpdateFavorite(3, false)));
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn sweeps_skip_when_probe_fails() {
    let engine = seeded_offline(catalog()).await;
    engine.post_favorite(1, true).await.unwrap();
    engine.post_review(form(1, "Ana", 4)).await.unwrap();
    engine.gateway().clear_calls();

    let report = engine.startup().await.unwrap();
    assert!(report.is_offline());
    let calls = engine.gateway().calls();
    assert!(calls.contains(&Call::Probe(Resource::Restaurants)));
    assert!(calls.contains(&Call::Probe(Resource::Reviews)));
    assert_eq!(calls.len(), 2);
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 1);
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn temp_reviews_are_cleared_after_successful_batch() {
    let engine = seeded_offline(catalog()).await;
    for (restaurant_id, name) in [(1, "Ana"), (2, "Bo"), (2, "Cy")] {
        engine
            .post_review(form(restaurant_id, name, 4))
            .await
            .unwrap();
    }
    engine.gateway().set_online(true);

    let report = engine.post_temp_reviews().await.unwrap();
    assert_eq!(report.synced, 3);
    assert!(report.is_clean());
    assert_eq!(engine.gateway().count(|call| *call == Call::CreateReviews(3)), 1);
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 0);

    // None of these restaurants had server reviews cached, so the replayed
    // reviews come back with the next full fetch.
    assert_eq!(engine.store().count::<Review>().await.unwrap(), 0);
    let routed = engine.route_reviews(2).await.unwrap();
    assert_eq!(routed.state, ReadState::Populated);
    assert_eq!(names(&routed.records), vec!["Bo", "Cy"]);
    assert!(routed.records.iter().all(|review| review.id.is_some()));
    assert!(engine
        .gateway()
        .submissions()
        .iter()
        .all(|submission| submission.review.id.is_none()));
}

#[tokio::test(flavor = "multi_thread")]
async fn temp_reviews_stay_queued_when_batch_fails() {
    let engine = seeded_offline(catalog()).await;
    for name in ["Ana", "Bo"] {
        engine.post_review(form(1, name, 4)).await.unwrap();
    }
    engine.gateway().set_online(true);
    engine.gateway().reject_writes(true);

    let report = engine.post_temp_reviews().await.unwrap();
    assert_eq!(report.synced, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].restaurant_id, None);
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn startup_runs_both_sweeps() {
    let engine = seeded_offline(catalog()).await;
    engine.post_favorite(2, true).await.unwrap();
    engine.post_review(form(2, "Ana", 5)).await.unwrap();
    engine.gateway().set_online(true);

    let report = engine.startup().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.favorites.synced, 1);
    assert_eq!(report.reviews.synced, 1);
    assert_eq!(engine.store().count::<PendingReview>().await.unwrap(), 0);
    assert_eq!(engine.store().count::<PendingFavorite>().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_queries_filter_the_routed_set() {
    let engine = engine(FakeGateway::online(catalog()));

    let brooklyn = engine
        .restaurants_by_cuisine_and_neighborhood(&Filter::parse("all"), &Filter::parse("Brooklyn"))
        .await
        .unwrap();
    assert_eq!(ids(&brooklyn), vec![2, 3]);

    assert_eq!(
        ids(&engine.restaurants_by_cuisine("Asian").await.unwrap()),
        vec![1]
    );
    assert_eq!(
        ids(&engine.restaurants_by_neighborhood("Brooklyn").await.unwrap()),
        vec![2, 3]
    );
    assert_eq!(
        engine.neighborhoods().await.unwrap(),
        vec!["Manhattan", "Brooklyn"]
    );
    assert_eq!(
        engine.cuisines().await.unwrap(),
        vec!["Asian", "Pizza", "American"]
    );
    assert_eq!(engine.restaurant_by_id(3).await.unwrap().id, 3);
    assert!(matches!(
        engine.restaurant_by_id(99).await,
        Err(Error::NotFound(_))
    ));
    assert_eq!(
        engine.gateway().count(|call| *call == Call::ListRestaurants),
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_while_offline_with_empty_store_reports_transport() {
    let engine = engine(FakeGateway::offline());
    assert!(matches!(
        engine.restaurant_by_id(1).await,
        Err(Error::Transport(_))
    ));
}
