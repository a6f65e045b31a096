//! Shared verification harness for per-venue conformance tests.
//!
//! Every connector declares an [`ExpectedFirstLive`] alongside its selectors;
//! the tests replay a saved copy of the venue's pages through a
//! [`FixtureLoader`](crate::dom::FixtureLoader) and check the extraction
//! against it. Date-dependent paths run in testing mode, which disables the
//! past-event cutoff so fixtures stay valid as time passes.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::dom::DocumentLoader;
use crate::fetchers::Simple;
use crate::timeutil;

/// JST timestamp literal for connector expectations.
pub fn jst(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<FixedOffset>> {
    timeutil::JST
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
}

/// Expected shape of a venue's first extracted live, plus the total count.
#[derive(Default)]
pub struct ExpectedFirstLive {
    pub live_count: usize,
    pub title: String,
    pub artists: Vec<String>,
    pub price: String,
    pub price_english: String,
    pub open_time: Option<DateTime<FixedOffset>>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub url: String,
    /// Some venues legitimately go months without announcements; their smoke
    /// check tolerates an empty result.
    pub known_empty: bool,
}

/// Runs the full extraction against fixture pages and compares the first
/// live field by field against the connector's [`ExpectedFirstLive`].
pub async fn verify_fixture(cfg: &Simple, loader: Arc<dyn DocumentLoader>) {
    let id = &cfg.venue_id;
    let result = cfg.fetch_mode(loader, true).await;
    if let Some(err) = result.error {
        panic!("{id}: fetch failed: {err}");
    }
    let expected = &cfg.expected;
    assert_eq!(
        result.lives.len(),
        expected.live_count,
        "{id}: live count mismatch"
    );
    let first = match result.lives.first() {
        Some(l) => l,
        None => return,
    };
    assert_eq!(first.title, expected.title, "{id}: title mismatch");
    assert_eq!(first.artists, expected.artists, "{id}: artists mismatch");
    assert_eq!(first.price, expected.price, "{id}: price mismatch");
    assert_eq!(
        first.price_english, expected.price_english,
        "{id}: english price mismatch"
    );
    if let Some(open) = expected.open_time {
        assert_eq!(first.open_time, open, "{id}: open time mismatch");
    }
    if let Some(start) = expected.start_time {
        assert_eq!(first.start_time, start, "{id}: start time mismatch");
    }
    if !expected.url.is_empty() {
        assert_eq!(first.url, expected.url, "{id}: url mismatch");
    }
    assert_eq!(first.venue.id, *id, "{id}: venue id mismatch");
}

/// Cheap sanity check: the venue yields at least one live with a title, or
/// is flagged `known_empty`.
pub async fn verify_not_empty(cfg: &Simple, loader: Arc<dyn DocumentLoader>) {
    let id = &cfg.venue_id;
    let result = cfg.fetch_mode(loader, true).await;
    if let Some(err) = result.error {
        panic!("{id}: fetch failed: {err}");
    }
    if cfg.expected.known_empty {
        return;
    }
    assert!(!result.lives.is_empty(), "{id}: no lives extracted");
    assert!(
        result.lives.iter().any(|l| !l.title.is_empty()),
        "{id}: every extracted live has an empty title"
    );
}
