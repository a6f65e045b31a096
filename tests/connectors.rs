//! Per-venue conformance tests: each connector replays saved copies of its
//! venue's pages and must extract exactly what it declares in `expected`.

use std::sync::Arc;

use chrono::Datelike;

use livehouse_scraper::connectors::tokyo;
use livehouse_scraper::dom::{DocumentLoader, FixtureLoader};
use livehouse_scraper::fetchers::harness;
use livehouse_scraper::timeutil;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[tokio::test]
async fn shimokitazawa_alley_conforms() {
    let cfg = tokyo::shimokitazawa_alley();
    let loader: Arc<dyn DocumentLoader> = Arc::new(
        FixtureLoader::new()
            .route(
                "https://shimokitazawa-alley.com/schedule/202406/",
                fixture("shimokitazawa_alley_202406.html"),
            )
            .route(
                "https://shimokitazawa-alley.com/schedule/202407/",
                fixture("shimokitazawa_alley_202407.html"),
            ),
    );
    harness::verify_fixture(&cfg, Arc::clone(&loader)).await;
    harness::verify_not_empty(&cfg, loader).await;
}

#[tokio::test]
async fn koenji_pulse_conforms() {
    let cfg = tokyo::koenji_pulse();
    // Month iteration starts at the current month; route it to the fixture
    // and the month after to an empty page so the chain terminates.
    let now = timeutil::now_jst();
    let (mut year, mut month) = (now.year(), now.month());
    let first = cfg.month_url(year, month);
    month += 1;
    if month > 12 {
        month = 1;
        year += 1;
    }
    let second = cfg.month_url(year, month);

    let loader: Arc<dyn DocumentLoader> = Arc::new(
        FixtureLoader::new()
            .route(first, fixture("koenji_pulse.html"))
            .route(second, fixture("koenji_pulse_empty.html")),
    );
    harness::verify_fixture(&cfg, Arc::clone(&loader)).await;
    harness::verify_not_empty(&cfg, loader).await;
}

#[tokio::test]
async fn shibuya_quarter_conforms() {
    let cfg = tokyo::shibuya_quarter();
    let loader: Arc<dyn DocumentLoader> = Arc::new(
        FixtureLoader::new()
            .route(
                "https://shibuya-quarter.com/schedule",
                fixture("shibuya_quarter_schedule.html"),
            )
            .route(
                "https://shibuya-quarter.com/live/0802",
                fixture("shibuya_quarter_0802.html"),
            )
            .route(
                "https://shibuya-quarter.com/live/0803",
                fixture("shibuya_quarter_0803.html"),
            ),
    );
    harness::verify_fixture(&cfg, Arc::clone(&loader)).await;
    harness::verify_not_empty(&cfg, loader).await;
}
