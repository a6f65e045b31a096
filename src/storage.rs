//! Persistence seam for lives and the artist catalog.
//!
//! The pipeline only talks to the [`Storage`] trait: list what a venue
//! currently holds, then commit a [`ReconcilePlan`]. The in-memory
//! implementation backs tests and one-shot CLI runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, ScraperError};
use crate::reconcile::ReconcilePlan;
use crate::types::Live;

/// Counts of what a commit actually changed.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CommitStats {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub new_artists: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// All stored lives for one venue, ordered by start time.
    async fn list_lives(&self, venue_id: &str) -> Result<Vec<Live>>;

    /// Applies a reconcile plan atomically.
    async fn commit(&self, plan: ReconcilePlan) -> Result<CommitStats>;
}

#[derive(Default)]
pub struct InMemoryStorage {
    lives: Mutex<HashMap<Uuid, Live>>,
    artists: Mutex<BTreeSet<String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artist_count(&self) -> usize {
        self.artists.lock().map(|a| a.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn list_lives(&self, venue_id: &str) -> Result<Vec<Live>> {
        let lives = self
            .lives
            .lock()
            .map_err(|_| ScraperError::Config("storage mutex poisoned".into()))?;
        let mut out: Vec<Live> = lives
            .values()
            .filter(|l| l.venue.id == venue_id)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.start_time);
        Ok(out)
    }

    async fn commit(&self, plan: ReconcilePlan) -> Result<CommitStats> {
        let mut lives = self
            .lives
            .lock()
            .map_err(|_| ScraperError::Config("storage mutex poisoned".into()))?;
        let mut artists = self
            .artists
            .lock()
            .map_err(|_| ScraperError::Config("storage mutex poisoned".into()))?;

        let mut stats = CommitStats::default();
        for id in &plan.to_delete {
            if lives.remove(id).is_some() {
                stats.deleted += 1;
            }
        }
        for (id, live) in plan.to_update {
            lives.insert(id, live);
            stats.updated += 1;
        }
        for mut live in plan.to_insert {
            let id = Uuid::new_v4();
            live.id = Some(id);
            lives.insert(id, live);
            stats.inserted += 1;
        }
        for artist in plan.touched_artists {
            if artists.insert(artist) {
                stats.new_artists += 1;
            }
        }
        Ok(stats)
    }
}
