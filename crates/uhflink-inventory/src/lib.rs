//! In-memory tag inventory for the current reading session.
//!
//! [`InventoryStore`] deduplicates tag sightings by EPC: the first sighting
//! creates a [`TagRead`] with `count = 1`, every later one bumps the count
//! and refreshes `last_seen_at`. Nothing is persisted; the store lives for
//! one inventory session and is cleared when the operator starts a new one.
//!
//! ```
//! use uhflink_core::TagSighting;
//! use uhflink_inventory::InventoryStore;
//!
//! let mut store = InventoryStore::new();
//! let sighting = TagSighting { epc: "E200".into(), antenna: 1, pc: 0x3000, rssi: -40 };
//!
//! store.record_sighting(sighting.clone());
//! store.record_sighting(sighting);
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.get("E200").unwrap().count, 2);
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::trace;
use uhflink_core::{TagRead, TagSighting};

/// Deduplicated tag records keyed by EPC.
#[derive(Debug, Default, Clone)]
pub struct InventoryStore {
    tags: HashMap<String, TagRead>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting at the current time.
    ///
    /// Returns the updated record.
    pub fn record_sighting(&mut self, sighting: TagSighting) -> &TagRead {
        self.record_sighting_at(sighting, Utc::now())
    }

    /// Record a sighting with an explicit timestamp.
    ///
    /// A repeat sighting only bumps `count` and `last_seen_at`; antenna, PC
    /// and RSSI keep the values of the first sighting.
    pub fn record_sighting_at(&mut self, sighting: TagSighting, now: DateTime<Utc>) -> &TagRead {
        let record = self
            .tags
            .entry(sighting.epc.clone())
            .and_modify(|tag| {
                tag.count = tag.count.saturating_add(1);
                tag.last_seen_at = now;
            })
            .or_insert_with(|| TagRead::first(sighting, now));

        trace!(epc = %record.epc, count = record.count, "tag recorded");
        record
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Snapshot of every record, in no particular order.
    pub fn list(&self) -> Vec<TagRead> {
        self.tags.values().cloned().collect()
    }

    pub fn get(&self, epc: &str) -> Option<&TagRead> {
        self.tags.get(epc)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Sum of all sightings across tags.
    pub fn total_reads(&self) -> u64 {
        self.tags.values().map(|tag| u64::from(tag.count)).sum()
    }
}
