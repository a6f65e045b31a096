//! The venue catalog. One module per prefecture; every venue is a function
//! returning its fetch configuration.

use crate::fetchers::Simple;

pub mod tokyo;

/// Every registered venue connector.
pub fn all() -> Vec<Simple> {
    vec![
        tokyo::shimokitazawa_alley(),
        tokyo::koenji_pulse(),
        tokyo::shibuya_quarter(),
    ]
}

/// Looks a connector up by its venue id.
pub fn find(venue_id: &str) -> Option<Simple> {
    all().into_iter().find(|c| c.venue_id == venue_id)
}
