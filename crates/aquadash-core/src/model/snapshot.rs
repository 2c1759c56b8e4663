use std::sync::Arc;

use serde::Serialize;
use strum::Display;

use crate::error::CoreError;

/// Lifecycle state of a cache entry, as seen through a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// No value, no error, nothing fetched yet.
    Empty,
    /// A fetch is in flight.
    Loading,
    /// A value is present and the last fetch succeeded.
    Ready,
    /// The last fetch failed; any earlier value is still present.
    Failed,
}

/// Point-in-time `{ data, loading, error }` view of one cache entry.
///
/// Cheap to clone: the value is behind an `Arc`, so every subscriber of an
/// entry shares one copy of the last reading.
#[derive(Debug)]
pub struct Snapshot<V> {
    pub data: Option<Arc<V>>,
    pub loading: bool,
    pub error: Option<CoreError>,
    /// Bumped on every notified update.
    pub(crate) revision: u64,
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            revision: self.revision,
        }
    }
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            revision: 0,
        }
    }
}

impl<V> Snapshot<V> {
    pub fn status(&self) -> EntryStatus {
        if self.loading {
            EntryStatus::Loading
        } else if self.error.is_some() {
            EntryStatus::Failed
        } else if self.data.is_some() {
            EntryStatus::Ready
        } else {
            EntryStatus::Empty
        }
    }

    /// Number of updates subscribers have been notified of.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `true` when `other` carries the same value allocation.
    pub fn same_data(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
