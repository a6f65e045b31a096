use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A livehouse, identified by a globally unique venue id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub prefecture: String,
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One scheduled show at a venue.
///
/// `start_time` is always populated; when only one of open/start could be
/// resolved from the page, the other is a copy of it. Lives are constructed
/// fresh on every scrape run and never mutated afterwards; reconciliation
/// decides whether a stored row gets replaced, not whether a `Live` is
/// edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Live {
    /// Storage identity, assigned on insert. `None` for freshly scraped lives.
    pub id: Option<Uuid>,
    pub title: String,
    pub artists: Vec<String>,
    pub open_time: DateTime<FixedOffset>,
    pub start_time: DateTime<FixedOffset>,
    /// Price text as written on the page.
    pub price: String,
    /// Price text with common Japanese ticketing terms translated.
    pub price_english: String,
    pub venue: Venue,
    /// Detail URL for the live.
    pub url: String,
}
