//! End-to-end pipeline: fetch from fixtures, reconcile against storage,
//! commit, and check that reruns and edits behave.

use std::sync::Arc;

use chrono::Duration;

use livehouse_scraper::connectors::tokyo;
use livehouse_scraper::dom::{DocumentLoader, FixtureLoader};
use livehouse_scraper::reconcile::reconcile;
use livehouse_scraper::storage::{InMemoryStorage, Storage};
use livehouse_scraper::types::Live;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn alley_loader() -> Arc<dyn DocumentLoader> {
    Arc::new(
        FixtureLoader::new()
            .route(
                "https://shimokitazawa-alley.com/schedule/202406/",
                fixture("shimokitazawa_alley_202406.html"),
            )
            .route(
                "https://shimokitazawa-alley.com/schedule/202407/",
                fixture("shimokitazawa_alley_202407.html"),
            ),
    )
}

async fn fetch_alley() -> Vec<Live> {
    let cfg = tokyo::shimokitazawa_alley();
    let result = cfg.fetch_for_tests(alley_loader()).await;
    assert!(result.error.is_none(), "{:?}", result.error.map(|e| e.to_string()));
    result.lives
}

async fn seed(storage: &InMemoryStorage, lives: &[Live]) {
    let plan = reconcile(lives, &[]);
    storage.commit(plan).await.unwrap();
}

#[tokio::test]
async fn rerun_of_identical_fetch_changes_nothing() {
    let lives = fetch_alley().await;
    assert_eq!(lives.len(), 4);

    let storage = InMemoryStorage::new();
    seed(&storage, &lives).await;
    let stored = storage.list_lives("shimokitazawa-alley").await.unwrap();
    assert_eq!(stored.len(), 4);

    let again = fetch_alley().await;
    let plan = reconcile(&again, &stored);
    assert!(plan.is_empty(), "identical refetch produced changes");
    let stats = storage.commit(plan).await.unwrap();
    assert_eq!(stats.inserted + stats.updated + stats.deleted, 0);
}

#[tokio::test]
async fn rescheduled_live_updates_its_existing_row() {
    let lives = fetch_alley().await;
    let storage = InMemoryStorage::new();
    seed(&storage, &lives).await;
    let stored = storage.list_lives("shimokitazawa-alley").await.unwrap();

    let mut moved = fetch_alley().await;
    let i = moved
        .iter()
        .position(|l| l.title == "FRIDAY SESSIONS")
        .unwrap();
    moved[i].start_time += Duration::hours(1);
    moved[i].open_time += Duration::hours(1);

    let plan = reconcile(&moved, &stored);
    assert!(plan.to_insert.is_empty());
    assert!(plan.to_delete.is_empty());
    assert_eq!(plan.to_update.len(), 1);

    storage.commit(plan).await.unwrap();
    let after = storage.list_lives("shimokitazawa-alley").await.unwrap();
    assert_eq!(after.len(), 4);
    let friday = after
        .iter()
        .find(|l| l.title == "FRIDAY SESSIONS")
        .unwrap();
    assert_eq!(friday.start_time, moved[i].start_time);
}

#[tokio::test]
async fn cancelled_live_is_deleted_within_the_fetch_window() {
    let lives = fetch_alley().await;
    let storage = InMemoryStorage::new();
    seed(&storage, &lives).await;
    let stored = storage.list_lives("shimokitazawa-alley").await.unwrap();

    // The venue pulls the middle show; its start falls inside the span of
    // the remaining batch, so it must go.
    let remaining: Vec<Live> = fetch_alley()
        .await
        .into_iter()
        .filter(|l| l.title != "FRIDAY SESSIONS")
        .collect();
    assert_eq!(remaining.len(), 3);

    let plan = reconcile(&remaining, &stored);
    assert!(plan.to_insert.is_empty());
    assert!(plan.to_update.is_empty());
    assert_eq!(plan.to_delete.len(), 1);

    let stats = storage.commit(plan).await.unwrap();
    assert_eq!(stats.deleted, 1);
    let after = storage.list_lives("shimokitazawa-alley").await.unwrap();
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|l| l.title != "FRIDAY SESSIONS"));
}

#[tokio::test]
async fn artist_catalog_grows_with_inserts() {
    let lives = fetch_alley().await;
    let storage = InMemoryStorage::new();
    let plan = reconcile(&lives, &[]);
    let stats = storage.commit(plan).await.unwrap();
    assert_eq!(stats.inserted, 4);
    // Every artist on the two fixture pages, deduplicated.
    assert_eq!(stats.new_artists, 8);
    assert_eq!(storage.artist_count(), 8);
}
