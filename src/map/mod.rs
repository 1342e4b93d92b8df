//! This module contains the definition of [`VersionedMap`], an associative container whose every
//! mutation produces a new, permanently queryable version.
//!
//! The map keeps a directory from key to a per-key fat node; each node holds the full,
//! tombstone-aware value history of its key. Logical removal records a tombstone rather than
//! deleting anything, so a key's directory entry persists forever once the key has been written.
//! A separate size history records the map's cardinality at every version.
//!
//! # Complexity
//!
//! Because the key directory only ever grows, the iteration family
//! ([`VersionedMap::keys_at`], [`VersionedMap::values_at`], [`VersionedMap::iter_at`] and their
//! current-version counterparts) scans every key ever written and filters out the ones
//! tombstoned at the queried version. A long-lived map with heavy key churn therefore grows
//! without bound, and iterating it costs time proportional to its entire write history, not to
//! its size at the queried version.

use alloc::collections::{BTreeMap, btree_map::Entry as DirectoryEntry};

use crate::{
    Result, VersionError,
    history::{Version, VersionHistory},
};

mod node;
use node::MapNode;


// VERSIONED MAP
// ================================================================================================

/// A partially persistent map: all past versions remain readable, while only the most recent
/// version may be mutated.
///
/// Mutating calls that write tick the map's private clock by exactly one and return the version
/// they wrote at; conditional mutators whose condition fails write nothing and leave the clock
/// untouched. Reads take an explicit version (or default to the current one) and resolve with
/// floor queries against the per-key histories.
///
/// Operations that report a previous or resulting value clone it out of the history, since the
/// stored values must remain readable at every past version; those operations bound `V: Clone`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "K: serde::Deserialize<'de> + Ord, V: serde::Deserialize<'de>"))
)]
pub struct VersionedMap<K, V> {
    /// The key directory. Entries are only ever added, never removed.
    nodes: BTreeMap<K, MapNode<V>>,

    /// The cardinality at every version at which it changed.
    sizes: VersionHistory<usize>,

    /// The map's private monotonic clock.
    current: Version,
}

impl<K: Ord, V> VersionedMap<K, V> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Constructs an empty map at version 0.
    #[must_use]
    pub fn new() -> Self {
        let mut sizes = VersionHistory::new();
        sizes.record(0, 0);
        Self { nodes: BTreeMap::new(), sizes, current: 0 }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the version produced by the most recent clock tick, or 0 if the map has never
    /// been mutated.
    #[must_use]
    pub fn current_version(&self) -> Version {
        self.current
    }

    /// Returns the number of keys present in the current version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size_at_unchecked(self.current)
    }

    /// Returns `true` if no key is present in the current version.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of keys present at `version`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn len_at(&self, version: Version) -> Result<usize> {
        self.check_version(version)?;
        Ok(self.size_at_unchecked(version))
    }

    /// Returns `true` if no key was present at `version`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn is_empty_at(&self, version: Version) -> Result<bool> {
        self.len_at(version).map(|size| size == 0)
    }

    /// Returns the value `key` maps to in the current version, or `None` if the key is absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.nodes.get(key).and_then(|node| node.value_at(self.current))
    }

    /// Returns the value `key` mapped to at `version`.
    ///
    /// A key is absent if it had not been written by `version`, or if its latest write at or
    /// before `version` was a removal.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn get_at(&self, key: &K, version: Version) -> Result<Option<&V>> {
        self.check_version(version)?;
        Ok(self.nodes.get(key).and_then(|node| node.value_at(version)))
    }

    /// Returns the value `key` maps to in the current version, or `default` if the key is
    /// absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value `key` mapped to at `version`, or `default` if the key was absent.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn get_or_at<'a>(&'a self, key: &K, default: &'a V, version: Version) -> Result<&'a V> {
        Ok(self.get_at(key, version)?.unwrap_or(default))
    }

    /// Returns `true` if `key` is present in the current version.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if `key` was present at `version`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn contains_key_at(&self, key: &K, version: Version) -> Result<bool> {
        self.get_at(key, version).map(|value| value.is_some())
    }

    /// Returns `true` if at least one key maps to `value` in the current version.
    ///
    /// # Complexity
    ///
    /// Linear in the number of keys ever written, as described in the module documentation.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.scan_at(self.current).any(|(_, candidate)| candidate == value)
    }

    /// Returns `true` if at least one key mapped to `value` at `version`.
    ///
    /// # Complexity
    ///
    /// Linear in the number of keys ever written, as described in the module documentation.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn contains_value_at(&self, value: &V, version: Version) -> Result<bool>
    where
        V: PartialEq,
    {
        self.check_version(version)?;
        Ok(self.scan_at(version).any(|(_, candidate)| candidate == value))
    }

    /// Returns an iterator over the keys present in the current version, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.scan_at(self.current).map(|(key, _)| key)
    }

    /// Returns an iterator over the keys present at `version`, in key order.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn keys_at(&self, version: Version) -> Result<impl Iterator<Item = &K>> {
        self.check_version(version)?;
        Ok(self.scan_at(version).map(|(key, _)| key))
    }

    /// Returns an iterator over the values present in the current version, in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.scan_at(self.current).map(|(_, value)| value)
    }

    /// Returns an iterator over the values present at `version`, in key order.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn values_at(&self, version: Version) -> Result<impl Iterator<Item = &V>> {
        self.check_version(version)?;
        Ok(self.scan_at(version).map(|(_, value)| value))
    }

    /// Returns an iterator over the entries present in the current version, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.scan_at(self.current)
    }

    /// Returns an iterator over the entries present at `version`, in key order.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn iter_at(&self, version: Version) -> Result<impl Iterator<Item = (&K, &V)>> {
        self.check_version(version)?;
        Ok(self.scan_at(version))
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Maps `key` to `value`, returning the version the write was recorded at together with the
    /// value the key mapped to just before it.
    ///
    /// A key written for the first time (or rewritten after a removal) increments the size of
    /// the new version; overwriting a present key leaves the size unchanged.
    pub fn insert(&mut self, key: K, value: V) -> (Version, Option<V>)
    where
        V: Clone,
    {
        let size = self.size_now();
        self.current += 1;
        let version = self.current;

        let (previous, was_present) = match self.nodes.entry(key) {
            DirectoryEntry::Vacant(slot) => {
                slot.insert(MapNode::new(value, version));
                (None, false)
            },
            DirectoryEntry::Occupied(slot) => {
                let node = slot.into_mut();
                let previous = node.value_at(version - 1).cloned();
                let was_present = previous.is_some();
                node.record(version, value);
                (previous, was_present)
            },
        };

        if !was_present {
            self.sizes.record(version, size + 1);
        }
        (version, previous)
    }

    /// Removes `key` from the map, returning the version consumed by the call together with the
    /// value the key mapped to just before it.
    ///
    /// The call consumes a version even when the key is already absent, but in that case writes
    /// nothing: the key's history and the size history are untouched. Removal of a present key
    /// is a tombstone write; the key's earlier values remain readable at their versions.
    pub fn remove(&mut self, key: &K) -> (Version, Option<V>)
    where
        V: Clone,
    {
        let size = self.size_now();
        self.current += 1;
        let version = self.current;

        let previous = match self.nodes.get_mut(key) {
            Some(node) => {
                let previous = node.value_at(version - 1).cloned();
                if previous.is_some() {
                    node.record_removed(version);
                    self.sizes.record(version, size - 1);
                }
                previous
            },
            None => None,
        };
        (version, previous)
    }

    /// Removes every key present in the current version and returns the version the removals
    /// were recorded at. The whole sweep consumes a single version.
    pub fn clear(&mut self) -> Version {
        self.current += 1;
        let version = self.current;

        for node in self.nodes.values_mut() {
            if node.is_present_at(version - 1) {
                node.record_removed(version);
            }
        }
        self.sizes.record(version, 0);
        version
    }

    /// Maps `key` to `value` only if the key is absent in the current version, returning the
    /// version written at, or `None` (with no clock tick) if the key was present.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> Option<Version> {
        if self.contains_key(&key) {
            return None;
        }

        let size = self.size_now();
        self.current += 1;
        let version = self.current;

        match self.nodes.entry(key) {
            DirectoryEntry::Vacant(slot) => {
                slot.insert(MapNode::new(value, version));
            },
            DirectoryEntry::Occupied(slot) => slot.into_mut().record(version, value),
        }
        self.sizes.record(version, size + 1);
        Some(version)
    }

    /// Removes `key` only if it currently maps to `expected`, returning the version written at,
    /// or `None` (with no clock tick) otherwise.
    pub fn remove_if(&mut self, key: &K, expected: &V) -> Option<Version>
    where
        V: PartialEq,
    {
        let size = self.size_now();
        let node = self.nodes.get_mut(key)?;
        if node.value_at(self.current) != Some(expected) {
            return None;
        }

        self.current += 1;
        node.record_removed(self.current);
        self.sizes.record(self.current, size - 1);
        Some(self.current)
    }

    /// Maps `key` to `value` only if the key is present in the current version, returning the
    /// version written at together with the previous value, or `None` (with no clock tick) if
    /// the key was absent.
    pub fn replace(&mut self, key: &K, value: V) -> Option<(Version, V)>
    where
        V: Clone,
    {
        let node = self.nodes.get_mut(key)?;
        let previous = node.value_at(self.current).cloned()?;

        self.current += 1;
        node.record(self.current, value);
        Some((self.current, previous))
    }

    /// Maps `key` to `value` only if the key currently maps to `expected`, returning the
    /// version written at, or `None` (with no clock tick) otherwise.
    pub fn replace_if(&mut self, key: &K, expected: &V, value: V) -> Option<Version>
    where
        V: PartialEq,
    {
        let node = self.nodes.get_mut(key)?;
        if node.value_at(self.current) != Some(expected) {
            return None;
        }

        self.current += 1;
        node.record(self.current, value);
        Some(self.current)
    }

    /// Combines `value` with the value `key` currently maps to.
    ///
    /// An absent key is mapped to `value` directly; a present key is remapped to
    /// `f(current, value)`, where a `None` result removes the key. The call always writes and
    /// returns the version written at together with the resulting value (`None` when the key
    /// was removed).
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> (Version, Option<V>)
    where
        V: Clone,
        F: FnOnce(&V, &V) -> Option<V>,
    {
        let size = self.size_now();
        let previous = self.nodes.get(&key).and_then(|node| node.value_at(self.current));
        let result = match previous {
            Some(old) => f(old, &value),
            None => Some(value),
        };
        let was_present = previous.is_some();

        self.current += 1;
        let version = self.current;
        let stored = result.clone();

        match self.nodes.entry(key) {
            DirectoryEntry::Vacant(slot) => {
                if let Some(merged) = result {
                    slot.insert(MapNode::new(merged, version));
                    self.sizes.record(version, size + 1);
                }
            },
            DirectoryEntry::Occupied(slot) => {
                let node = slot.into_mut();
                match result {
                    Some(merged) => {
                        node.record(version, merged);
                        if !was_present {
                            self.sizes.record(version, size + 1);
                        }
                    },
                    None => {
                        node.record_removed(version);
                        self.sizes.record(version, size - 1);
                    },
                }
            },
        }
        (version, stored)
    }

    /// Remaps `key` through `f`, which receives the key and its current value (or `None` if
    /// absent).
    ///
    /// A `Some` result is written (creating the key if needed); a `None` result removes a
    /// present key and is a no-op, with no clock tick, for an absent one. Returns the version
    /// written at (if a write occurred) together with the resulting value.
    pub fn compute<F>(&mut self, key: K, f: F) -> (Option<Version>, Option<V>)
    where
        V: Clone,
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        let size = self.size_now();
        let previous = self.nodes.get(&key).and_then(|node| node.value_at(self.current));
        let was_present = previous.is_some();
        let result = f(&key, previous);

        match result {
            Some(value) => {
                self.current += 1;
                let version = self.current;
                let stored = value.clone();
                match self.nodes.entry(key) {
                    DirectoryEntry::Vacant(slot) => {
                        slot.insert(MapNode::new(value, version));
                    },
                    DirectoryEntry::Occupied(slot) => slot.into_mut().record(version, value),
                }
                if !was_present {
                    self.sizes.record(version, size + 1);
                }
                (Some(version), Some(stored))
            },
            None if was_present => {
                self.current += 1;
                let version = self.current;
                if let Some(node) = self.nodes.get_mut(&key) {
                    node.record_removed(version);
                }
                self.sizes.record(version, size - 1);
                (Some(version), None)
            },
            None => (None, None),
        }
    }

    /// Maps `key` to `f(&key)` only if the key is absent in the current version.
    ///
    /// Returns the existing value (with no clock tick) for a present key; otherwise writes the
    /// `Some` result of `f` and returns it with the version written at. A `None` result from
    /// `f` declines the insertion and nothing is written.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> (Option<Version>, Option<V>)
    where
        V: Clone,
        F: FnOnce(&K) -> Option<V>,
    {
        if let Some(existing) = self.nodes.get(&key).and_then(|node| node.value_at(self.current)) {
            return (None, Some(existing.clone()));
        }
        let Some(value) = f(&key) else {
            return (None, None);
        };

        let size = self.size_now();
        self.current += 1;
        let version = self.current;
        let stored = value.clone();

        match self.nodes.entry(key) {
            DirectoryEntry::Vacant(slot) => {
                slot.insert(MapNode::new(value, version));
            },
            DirectoryEntry::Occupied(slot) => slot.into_mut().record(version, value),
        }
        self.sizes.record(version, size + 1);
        (Some(version), Some(stored))
    }

    /// Remaps `key` through `f` only if the key is present in the current version.
    ///
    /// A `Some` result is written; a `None` result removes the key. Returns the version written
    /// at (if the key was present) together with the resulting value. An absent key is a no-op
    /// with no clock tick.
    pub fn compute_if_present<F>(&mut self, key: &K, f: F) -> (Option<Version>, Option<V>)
    where
        V: Clone,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let size = self.size_now();
        let node = match self.nodes.get_mut(key) {
            Some(node) => node,
            None => return (None, None),
        };
        let result = match node.value_at(self.current) {
            Some(old) => f(key, old),
            None => return (None, None),
        };

        self.current += 1;
        let version = self.current;
        match result {
            Some(value) => {
                let stored = value.clone();
                node.record(version, value);
                (Some(version), Some(stored))
            },
            None => {
                node.record_removed(version);
                self.sizes.record(version, size - 1);
                (Some(version), None)
            },
        }
    }

    /// Writes every entry of `entries` into the map, consuming a single version for the whole
    /// batch, and returns that version.
    ///
    /// When `entries` yields the same key more than once, the last value wins, so each key
    /// receives at most one write at the new version.
    pub fn extend<I>(&mut self, entries: I) -> Version
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut batch = BTreeMap::new();
        for (key, value) in entries {
            batch.insert(key, value);
        }

        let size = self.size_now();
        self.current += 1;
        let version = self.current;

        let mut added = 0;
        for (key, value) in batch {
            match self.nodes.entry(key) {
                DirectoryEntry::Vacant(slot) => {
                    slot.insert(MapNode::new(value, version));
                    added += 1;
                },
                DirectoryEntry::Occupied(slot) => {
                    let node = slot.into_mut();
                    if !node.is_present_at(version - 1) {
                        added += 1;
                    }
                    node.record(version, value);
                },
            }
        }
        if added > 0 {
            self.sizes.record(version, size + added);
        }
        version
    }

    /// Remaps every key present in the current version through `f`, consuming a single version
    /// for the whole sweep, and returns that version.
    pub fn replace_all<F>(&mut self, mut f: F) -> Version
    where
        V: Clone,
        F: FnMut(&K, &V) -> V,
    {
        self.current += 1;
        let version = self.current;

        for (key, node) in self.nodes.iter_mut() {
            let Some(old) = node.value_at(version - 1).cloned() else {
                continue;
            };
            node.record(version, f(key, &old));
        }
        version
    }

    // HELPER METHODS
    // --------------------------------------------------------------------------------------------

    /// Iterates the entries present at `version` without validating the version bound.
    fn scan_at(&self, version: Version) -> impl Iterator<Item = (&K, &V)> {
        self.nodes
            .iter()
            .filter_map(move |(key, node)| node.value_at(version).map(|value| (key, value)))
    }

    /// Returns the cardinality at `version` without validating the version bound.
    ///
    /// The size history is seeded at version 0, so the floor resolves for every version a
    /// validated caller can pass.
    fn size_at_unchecked(&self, version: Version) -> usize {
        self.sizes.value_at(version).copied().unwrap_or_default()
    }

    fn size_now(&self) -> usize {
        self.size_at_unchecked(self.current)
    }

    fn check_version(&self, version: Version) -> Result<()> {
        if version > self.current {
            return Err(VersionError::VersionNotFound {
                requested: version,
                current: self.current,
            });
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for VersionedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
