//! Concurrent tag accumulation store.
//!
//! Inventory results land here. The store keeps one [`TagRecord`] per
//! identity key (the raw EPC byte sequence) plus two transient drain maps:
//! tags *added* since the last drain and tags *updated* since the last
//! drain. A key passes through `added` exactly once per store lifetime;
//! every later observation of it lands in `updated`.
//!
//! The main map and both drain maps live behind a single mutex, and every
//! operation takes that lock internally. In particular each drain is one
//! atomic read-then-clear under one lock acquisition — splitting the read
//! and the clear would lose observations arriving in between while the
//! inventory producer is running. The internal maps are never exposed.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Mutex;
use tagstream_core::to_hex_string;
use tagstream_transport::events::TagObservation;

/// Accumulated state of one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Raw tag identifier bytes (EPC or equivalent). Identity key.
    pub epc: Vec<u8>,

    /// Most recently reported signal strength, in dBm. Overwritten on
    /// every sighting, not averaged or maximized.
    pub rssi: i16,

    /// Auxiliary bank data from the most recent sighting that carried any.
    pub data: Option<Vec<u8>>,

    /// When the tag was first observed.
    pub first_seen: DateTime<Utc>,

    /// When the tag was last observed.
    pub last_seen: DateTime<Utc>,

    /// Number of observations, starting at 1.
    pub update_count: u32,
}

impl TagRecord {
    fn from_observation(observation: TagObservation, now: DateTime<Utc>) -> Self {
        Self {
            epc: observation.epc,
            rssi: observation.rssi,
            data: observation.data,
            first_seen: now,
            last_seen: now,
            update_count: 1,
        }
    }

    /// Get the EPC as an uppercase hex string.
    pub fn epc_hex(&self) -> String {
        to_hex_string(&self.epc)
    }

    /// How long the tag has been visible (last seen minus first seen).
    pub fn time_visible(&self) -> chrono::Duration {
        self.last_seen - self.first_seen
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    tags: HashMap<Vec<u8>, TagRecord>,
    added: IndexMap<Vec<u8>, TagRecord>,
    updated: IndexMap<Vec<u8>, TagRecord>,
}

/// Concurrent store of tag observations.
///
/// A single producer (the session's event dispatch, or a blocking
/// inventory call — never both at once) ingests observations while any
/// number of consumers drain and snapshot concurrently.
///
/// # Examples
///
/// ```
/// use tagstream_client::TagStore;
/// use tagstream_transport::events::TagObservation;
///
/// let store = TagStore::new();
/// store.ingest(TagObservation::new(vec![0xE2, 0x01], -48));
/// store.ingest(TagObservation::new(vec![0xE2, 0x02], -61));
/// store.ingest(TagObservation::new(vec![0xE2, 0x01], -52));
///
/// let added = store.drain_added();
/// assert_eq!(added.len(), 2);
/// assert_eq!(added[0].rssi, -48); // first-sight snapshot, first-sight order
///
/// let updated = store.drain_updated();
/// assert_eq!(updated.len(), 1);
/// assert_eq!(updated[0].rssi, -52);
///
/// // Drains are destructive
/// assert!(store.drain_added().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct TagStore {
    inner: Mutex<StoreInner>,
}

impl TagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one observation. Returns `true` if the key was new.
    ///
    /// A new key inserts into the main map and the *added* drain map (as a
    /// snapshot of this first observation). A known key overwrites rssi,
    /// bumps `last_seen` and `update_count`, merges auxiliary data, and
    /// inserts/overwrites the latest state in the *updated* drain map —
    /// it never touches *added* again, even before the first drain.
    pub fn ingest(&self, observation: TagObservation) -> bool {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("tag store lock poisoned");

        match inner.tags.get_mut(&observation.epc) {
            Some(record) => {
                record.rssi = observation.rssi;
                record.last_seen = now;
                record.update_count = record.update_count.saturating_add(1);
                if observation.data.is_some() {
                    record.data = observation.data;
                }
                let snapshot = record.clone();
                inner.updated.insert(snapshot.epc.clone(), snapshot);
                false
            }
            None => {
                let record = TagRecord::from_observation(observation, now);
                inner.added.insert(record.epc.clone(), record.clone());
                inner.tags.insert(record.epc.clone(), record);
                true
            }
        }
    }

    /// Atomically take and clear the tags added since the last drain.
    ///
    /// Records are returned in first-sight order, each a snapshot of its
    /// key's first observation. Immediately draining again with no
    /// intervening ingest returns an empty sequence.
    pub fn drain_added(&self) -> Vec<TagRecord> {
        let mut inner = self.inner.lock().expect("tag store lock poisoned");
        inner.added.drain(..).map(|(_, record)| record).collect()
    }

    /// Atomically take and clear the tags updated since the last drain.
    ///
    /// Each record is the key's latest state at its most recent sighting.
    pub fn drain_updated(&self) -> Vec<TagRecord> {
        let mut inner = self.inner.lock().expect("tag store lock poisoned");
        inner.updated.drain(..).map(|(_, record)| record).collect()
    }

    /// Point-in-time copy of every record in the store.
    pub fn snapshot(&self) -> Vec<TagRecord> {
        let inner = self.inner.lock().expect("tag store lock poisoned");
        inner.tags.values().cloned().collect()
    }

    /// The record with the strongest signal, if any.
    pub fn best_tag(&self) -> Option<TagRecord> {
        let inner = self.inner.lock().expect("tag store lock poisoned");
        inner.tags.values().max_by_key(|r| r.rssi).cloned()
    }

    /// Number of distinct tags in the store.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("tag store lock poisoned").tags.len()
    }

    /// Whether the store holds no tags.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset the main map and both drain maps.
    ///
    /// Precondition: no ingestion may be in flight — stop streaming first.
    /// Clearing while a producer is running is a contract violation; keys
    /// observed again afterwards re-enter `added` as if never seen.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("tag store lock poisoned");
        inner.tags.clear();
        inner.added.clear();
        inner.updated.clear();
    }
}
