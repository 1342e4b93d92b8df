use crate::history::{Version, VersionHistory};

// MAP NODE
// ================================================================================================

/// The per-key fat node of a [`VersionedMap`](super::VersionedMap).
///
/// A node is created the first time its key is written and lives for as long as the map does,
/// regardless of how often the key is logically removed afterward. Removal is recorded as a
/// tombstone in the node's value history, so presence at a version is a property of the floor
/// entry at that version, not of the node's existence.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub(super) struct MapNode<V> {
    history: VersionHistory<V>,
}

impl<V> MapNode<V> {
    /// Creates a node whose key first becomes present at `version` with `value`.
    pub fn new(value: V, version: Version) -> Self {
        let mut history = VersionHistory::new();
        history.record(version, value);
        Self { history }
    }

    /// Returns the value observable at `version`, or `None` if the key was removed at or before
    /// `version`, or not yet written by then.
    pub fn value_at(&self, version: Version) -> Option<&V> {
        self.history.value_at(version)
    }

    /// Returns `true` if the key is logically present at `version`.
    pub fn is_present_at(&self, version: Version) -> bool {
        self.value_at(version).is_some()
    }

    /// Records `value` at `version`.
    pub fn record(&mut self, version: Version, value: V) {
        self.history.record(version, value);
    }

    /// Records a tombstone at `version`, making the key read as absent from that version
    /// onward.
    pub fn record_removed(&mut self, version: Version) {
        self.history.record_vacant(version);
    }
}
