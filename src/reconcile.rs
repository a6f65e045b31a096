//! Diffing freshly fetched lives against what storage already holds.
//!
//! Venues edit announcements in place: times shift, acts get added, whole
//! shows vanish. A fetch therefore cannot blindly insert. `reconcile`
//! produces a plan of inserts, updates and deletes such that applying it
//! makes storage mirror the new batch inside the batch's own time window,
//! while leaving everything outside that window alone.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::types::Live;

/// The change set produced by [`reconcile`]. Applying it is storage's job.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub to_insert: Vec<Live>,
    /// Existing id paired with the full replacement value.
    pub to_update: Vec<(Uuid, Live)>,
    pub to_delete: Vec<Uuid>,
    /// Artist names appearing in any inserted or updated live, for keeping
    /// the artist catalog current.
    pub touched_artists: BTreeSet<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Order-insensitive artist comparison; venues reorder lineups freely.
fn same_artists(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}

fn differs(new: &Live, old: &Live) -> bool {
    new.title != old.title
        || !same_artists(&new.artists, &old.artists)
        || new.open_time != old.open_time
        || new.start_time != old.start_time
        || new.price != old.price
        || new.price_english != old.price_english
        || new.venue.id != old.venue.id
        || new.url != old.url
}

/// Index of the live in `pool` with the same title closest in start time to
/// `target`, skipping indices for which `skip` is true. Ties go to the later
/// index.
fn nearest(target: &Live, pool: &[Live], skip: impl Fn(usize) -> bool) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (j, cand) in pool.iter().enumerate() {
        if skip(j) || cand.title != target.title {
            continue;
        }
        let d = (cand.start_time - target.start_time).num_seconds().abs();
        match best {
            Some((_, bd)) if d > bd => {}
            _ => best = Some((j, d)),
        }
    }
    best.map(|(j, _)| j)
}

/// Matches `new` against `old` and plans the difference.
///
/// A new live pairs with an old one when their start times are identical, or
/// when they share a title and each is the other's nearest unmatched
/// neighbor by start-time distance. Matched pairs whose fields differ become
/// updates; unmatched new lives become inserts. Old lives left unmatched are
/// deleted only when they fall inside the new batch's start-time span, so an
/// empty batch deletes nothing.
pub fn reconcile(new: &[Live], old: &[Live]) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut old_claimed = vec![false; old.len()];
    let mut new_matched = vec![false; new.len()];

    // Identical start times pair unconditionally; a venue never runs two
    // shows starting at the same instant.
    for (i, live) in new.iter().enumerate() {
        let hit = old
            .iter()
            .enumerate()
            .find(|(j, o)| !old_claimed[*j] && o.start_time == live.start_time);
        if let Some((j, _)) = hit {
            old_claimed[j] = true;
            new_matched[i] = true;
            record_match(&mut plan, live, &old[j]);
        }
    }

    // Remaining lives pair by title through mutual nearest neighbor, which
    // keeps a rescheduled show attached to its old row even when several
    // same-titled shows moved at once.
    for i in 0..new.len() {
        if new_matched[i] {
            continue;
        }
        let Some(j) = nearest(&new[i], old, |j| old_claimed[j]) else {
            continue;
        };
        let back = nearest(&old[j], new, |i| new_matched[i]);
        if back == Some(i) {
            old_claimed[j] = true;
            new_matched[i] = true;
            record_match(&mut plan, &new[i], &old[j]);
        }
    }

    for (i, live) in new.iter().enumerate() {
        if !new_matched[i] {
            plan.to_insert.push(live.clone());
            plan.touched_artists.extend(live.artists.iter().cloned());
        }
    }

    if let (Some(lo), Some(hi)) = (
        new.iter().map(|l| l.start_time).min(),
        new.iter().map(|l| l.start_time).max(),
    ) {
        for (j, o) in old.iter().enumerate() {
            if old_claimed[j] || o.start_time < lo || o.start_time > hi {
                continue;
            }
            if let Some(id) = o.id {
                plan.to_delete.push(id);
            }
        }
    }

    plan
}

fn record_match(plan: &mut ReconcilePlan, new: &Live, old: &Live) {
    if !differs(new, old) {
        return;
    }
    let Some(id) = old.id else {
        return;
    };
    let mut updated = new.clone();
    updated.id = Some(id);
    plan.touched_artists.extend(updated.artists.iter().cloned());
    plan.to_update.push((id, updated));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Venue;
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    fn venue() -> Venue {
        Venue {
            id: "test-venue".into(),
            prefecture: "tokyo".into(),
            area: "shimokitazawa".into(),
            latitude: 35.66,
            longitude: 139.66,
        }
    }

    fn live(title: &str, day: u32, hour: u32, min: u32) -> Live {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let start = jst.with_ymd_and_hms(2024, 6, day, hour, min, 0).unwrap();
        Live {
            id: None,
            title: title.to_string(),
            artists: vec!["BAND A".into(), "BAND B".into()],
            open_time: start,
            start_time: start,
            price: "¥2,500".into(),
            price_english: "¥2,500".into(),
            venue: venue(),
            url: "https://example.com/live".into(),
        }
    }

    fn stored(l: &Live) -> Live {
        let mut l = l.clone();
        l.id = Some(Uuid::new_v4());
        l
    }

    #[test]
    fn everything_inserts_into_empty_storage() {
        let new = vec![live("A", 1, 19, 0), live("B", 2, 19, 0)];
        let plan = reconcile(&new, &[]);
        assert_eq!(plan.to_insert.len(), 2);
        assert!(plan.to_update.is_empty());
        assert!(plan.to_delete.is_empty());
        assert!(plan.touched_artists.contains("BAND A"));
    }

    #[test]
    fn refetch_of_unchanged_lives_is_a_noop() {
        let new = vec![live("A", 1, 19, 0), live("B", 2, 19, 0)];
        let old: Vec<Live> = new.iter().map(stored).collect();
        let plan = reconcile(&new, &old);
        assert!(plan.is_empty(), "unchanged refetch produced changes");
    }

    #[test]
    fn reordered_artists_do_not_update() {
        let new = vec![live("A", 1, 19, 0)];
        let mut old = vec![stored(&new[0])];
        old[0].artists.reverse();
        assert!(reconcile(&new, &old).is_empty());
    }

    #[test]
    fn time_shift_updates_in_place() {
        let old = vec![stored(&live("A", 1, 19, 0))];
        let new = vec![live("A", 1, 20, 0)];
        let plan = reconcile(&new, &old);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.to_update.len(), 1);
        let (id, updated) = &plan.to_update[0];
        assert_eq!(Some(*id), old[0].id);
        assert_eq!(updated.start_time, new[0].start_time);
    }

    #[test]
    fn translated_price_change_updates_in_place() {
        // The raw price is unchanged but the translation table improved;
        // the stored row must pick up the new translated text.
        let new = vec![live("A", 1, 19, 0)];
        let mut old = vec![stored(&new[0])];
        old[0].price_english = "2,500 yen".into();
        let plan = reconcile(&new, &old);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].1.price_english, new[0].price_english);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn venue_change_updates_in_place() {
        let new = vec![live("A", 1, 19, 0)];
        let mut old = vec![stored(&new[0])];
        old[0].venue.id = "another-venue".into();
        let plan = reconcile(&new, &old);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].1.venue.id, "test-venue");
    }

    #[test]
    fn same_start_time_matches_despite_renamed_title() {
        let old = vec![stored(&live("OLD TITLE", 1, 19, 0))];
        let new = vec![live("NEW TITLE", 1, 19, 0)];
        let plan = reconcile(&new, &old);
        assert_eq!(plan.to_update.len(), 1);
        assert!(plan.to_insert.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn mutual_nearest_neighbor_disambiguates() {
        // One stored show at 18:30; the new batch has the same title at
        // 18:00 and 21:00. The 18:00 one is the mutual nearest and claims
        // the stored row, the other inserts.
        let old = vec![stored(&live("SPLIT BILL", 1, 18, 30))];
        let new = vec![live("SPLIT BILL", 1, 18, 0), live("SPLIT BILL", 1, 21, 0)];
        let plan = reconcile(&new, &old);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].1.start_time, new[0].start_time);
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].start_time, new[1].start_time);
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn vanished_lives_inside_the_window_are_deleted() {
        let gone = stored(&live("GONE", 2, 19, 0));
        let kept_outside = stored(&live("OUTSIDE", 9, 19, 0));
        let old = vec![gone.clone(), kept_outside];
        let new = vec![live("A", 1, 19, 0), live("B", 3, 19, 0)];
        let plan = reconcile(&new, &old);
        assert_eq!(plan.to_insert.len(), 2);
        assert_eq!(plan.to_delete, vec![gone.id.unwrap()]);
    }

    #[test]
    fn empty_batch_deletes_nothing() {
        let old = vec![stored(&live("A", 1, 19, 0))];
        let plan = reconcile(&[], &old);
        assert!(plan.is_empty());
    }
}
