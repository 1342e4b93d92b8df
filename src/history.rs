//! This module contains the definition of [`VersionHistory`], the fat-node primitive underlying
//! every container in this crate.
//!
//! A fat node keeps the entire write history of one logical slot instead of a single current
//! value: an ordered mapping from the version at which a write occurred to the value (or
//! tombstone) it wrote. Point-in-time reads resolve with a _floor query_, returning the entry
//! with the greatest version at or before the queried one.
//!
//! # Complexity
//!
//! Entries are kept in a [`BTreeMap`], so both recording and floor queries are logarithmic in
//! the number of writes the slot has ever received. No entry is ever overwritten or removed, so
//! a heavily rewritten slot grows without bound; that is the price of keeping every past
//! version readable.
//!
//! # Time
//!
//! The history itself has no notion of a global clock. Owning containers hand out strictly
//! increasing versions from their private clocks and are responsible for rejecting reads beyond
//! the present; the only guard at this level is a debug assertion on write ordering.

use alloc::collections::BTreeMap;

// VERSION
// ================================================================================================

/// A point in a container's mutation history.
///
/// Versions are strictly increasing integers. Each mutating call on a container consumes exactly
/// one, and the consumed version is returned to the caller so the state produced by that exact
/// mutation can be queried later.
pub type Version = u64;

// ENTRY
// ================================================================================================

/// A single record in a [`VersionHistory`]: a live value, or a tombstone marking the slot as
/// logically absent from the recording version onward.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Entry<T> {
    /// A value written at the recording version.
    Occupied(T),

    /// Logical absence from the recording version onward, until rewritten.
    Vacant,
}

impl<T> Entry<T> {
    /// Returns the live value, or `None` for a tombstone.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant => None,
        }
    }

    /// Returns `true` if this entry is a tombstone.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        matches!(self, Entry::Vacant)
    }
}

// VERSION HISTORY
// ================================================================================================

/// An append-only mapping from version to value-or-tombstone with floor-query reads.
///
/// Two invariants hold for every history:
///
/// - versions strictly increase as entries are recorded, and
/// - once recorded, an entry is never overwritten or removed.
///
/// Together they make floor queries deterministic: two reads at the same version always observe
/// the same entry, no matter how many writes happened in between. That is the entire
/// correctness argument for partial persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VersionHistory<T> {
    entries: BTreeMap<Version, Entry<T>>,
}

impl<T> VersionHistory<T> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Constructs a history with no entries.
    ///
    /// Floor queries against an empty history return `None` for every version; containers that
    /// need a defined value at version 0 must seed one at creation.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the entry with the greatest version at or before `version`, along with the
    /// version it was recorded at, or `None` if nothing was recorded at or before `version`.
    #[must_use]
    pub fn floor(&self, version: Version) -> Option<(Version, &Entry<T>)> {
        self.entries.range(..=version).next_back().map(|(v, entry)| (*v, entry))
    }

    /// Returns the live value observable at `version`.
    ///
    /// Both a tombstone at the floor and a wholly unrecorded past read as `None`; callers that
    /// need to distinguish the two should use [`Self::floor`].
    #[must_use]
    pub fn value_at(&self, version: Version) -> Option<&T> {
        self.floor(version).and_then(|(_, entry)| entry.value())
    }

    /// Returns the version of the most recent entry, or `None` for an empty history.
    #[must_use]
    pub fn latest_version(&self) -> Option<Version> {
        self.entries.last_key_value().map(|(v, _)| *v)
    }

    /// Returns the number of entries ever recorded.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Records `value` at `version`.
    ///
    /// The caller must supply a version strictly greater than every previously recorded one;
    /// owning containers guarantee this through their monotonic clocks.
    pub fn record(&mut self, version: Version, value: T) {
        self.record_entry(version, Entry::Occupied(value));
    }

    /// Records a tombstone at `version`, making the slot read as absent from that version
    /// onward.
    pub fn record_vacant(&mut self, version: Version) {
        self.record_entry(version, Entry::Vacant);
    }

    fn record_entry(&mut self, version: Version, entry: Entry<T>) {
        debug_assert!(
            self.latest_version().is_none_or(|latest| latest < version),
            "histories are append-only: version {version} is not past the latest entry",
        );
        self.entries.insert(version, entry);
    }
}

// TESTS
// ================================================================================================
