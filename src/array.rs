//! This module contains the definition of [`VersionedArray`], a sequence whose every mutation
//! produces a new, permanently queryable version.
//!
//! Each slot of the array is a [`VersionHistory`] holding every value the slot has ever been
//! assigned, and a separate length history records the logical length at every version. The two
//! are orthogonal axes of versioning: [`VersionedArray::replace`] writes a slot without touching
//! the length history, and [`VersionedArray::remove_last`] shrinks the length without touching
//! any slot. A slot dropped by `remove_last` keeps its history and is resurrected, values
//! intact, if the array later grows back over it.

use alloc::vec::Vec;

use crate::{
    Result, VersionError,
    history::{Version, VersionHistory},
};

// VERSIONED ARRAY
// ================================================================================================

/// A partially persistent array: all past versions remain readable, while only the most recent
/// version may be mutated.
///
/// Every mutating call ticks the array's private clock by exactly one and returns the new
/// version. Reads take an explicit version (or default to the current one) and resolve with
/// floor queries, so a read at version `v` is unaffected by any mutation made after `v`.
///
/// A freshly created array of logical length `n` reads as `n` unassigned slots: in-range reads
/// of a slot that was never written return `None`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VersionedArray<T> {
    /// One value history per index ever physically allocated. Slots are allocated as growth
    /// demands and never removed.
    slots: Vec<VersionHistory<T>>,

    /// The logical length at every version. Only [`Self::push`] and [`Self::remove_last`] write
    /// here.
    lengths: VersionHistory<usize>,

    /// The array's private monotonic clock.
    current: Version,
}

impl<T> VersionedArray<T> {
    /// The logical length of an array created through [`Self::new`].
    pub const DEFAULT_LEN: usize = 10;

    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Constructs an array of logical length [`Self::DEFAULT_LEN`] at version 0, with every slot
    /// unassigned.
    #[must_use]
    pub fn new() -> Self {
        Self::with_len(Self::DEFAULT_LEN)
    }

    /// Constructs an array of logical length `len` at version 0, with every slot unassigned.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        for _ in 0..len {
            let mut slot = VersionHistory::new();
            slot.record_vacant(0);
            slots.push(slot);
        }

        let mut lengths = VersionHistory::new();
        lengths.record(0, len);

        Self { slots, lengths, current: 0 }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the version produced by the most recent mutation, or 0 if the array has never
    /// been mutated.
    #[must_use]
    pub fn current_version(&self) -> Version {
        self.current
    }

    /// Returns the logical length of the current version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length_at(self.current)
    }

    /// Returns `true` if the current version has logical length zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the logical length of the array at `version`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn len_at(&self, version: Version) -> Result<usize> {
        self.check_version(version)?;
        Ok(self.length_at(version))
    }

    /// Returns `true` if the array had logical length zero at `version`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    pub fn is_empty_at(&self, version: Version) -> Result<bool> {
        self.len_at(version).map(|len| len == 0)
    }

    /// Returns the element at `index` in the current version, or `None` if the slot is in range
    /// but was never assigned.
    ///
    /// # Errors
    ///
    /// - [`VersionError::IndexOutOfRange`] if `index` is not below the current logical length.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        self.get_at(index, self.current)
    }

    /// Returns the element at `index` as it was at `version`, or `None` if the slot was in
    /// range but unassigned at that version.
    ///
    /// # Errors
    ///
    /// - [`VersionError::VersionNotFound`] if `version` exceeds the current version.
    /// - [`VersionError::IndexOutOfRange`] if `index` is not below the logical length at
    ///   `version`.
    pub fn get_at(&self, index: usize, version: Version) -> Result<Option<&T>> {
        self.check_version(version)?;

        let len = self.length_at(version);
        if index >= len {
            return Err(VersionError::IndexOutOfRange { index, len });
        }

        Ok(self.slots.get(index).and_then(|slot| slot.value_at(version)))
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Appends `value` to the end of the array, growing the logical length by one, and returns
    /// the version the append was recorded at.
    ///
    /// If the append re-covers a slot previously dropped by [`Self::remove_last`], the slot's
    /// older values remain readable at their original versions.
    pub fn push(&mut self, value: T) -> Version {
        let len = self.len();
        if len >= self.slots.len() {
            self.slots.push(VersionHistory::new());
        }

        self.current += 1;
        self.slots[len].record(self.current, value);
        self.lengths.record(self.current, len + 1);
        self.current
    }

    /// Shrinks the logical length by one and returns the version the removal was recorded at.
    ///
    /// This is a soft delete: the dropped slot's value history is untouched, and reads at
    /// earlier versions still see the slot in range.
    ///
    /// # Errors
    ///
    /// - [`VersionError::EmptyCollection`] if the current logical length is zero.
    pub fn remove_last(&mut self) -> Result<Version> {
        let len = self.len();
        if len == 0 {
            return Err(VersionError::EmptyCollection);
        }

        self.current += 1;
        self.lengths.record(self.current, len - 1);
        Ok(self.current)
    }

    /// Replaces the element at `index` in the current version with `value` and returns the
    /// version the write was recorded at.
    ///
    /// The length history is not touched: content and length are versioned independently.
    ///
    /// # Errors
    ///
    /// - [`VersionError::IndexOutOfRange`] if `index` is not below the current logical length.
    pub fn replace(&mut self, index: usize, value: T) -> Result<Version> {
        let len = self.len();
        if index >= len {
            return Err(VersionError::IndexOutOfRange { index, len });
        }

        self.current += 1;
        self.slots[index].record(self.current, value);
        Ok(self.current)
    }

    // HELPER METHODS
    // --------------------------------------------------------------------------------------------

    /// Returns the logical length at `version` without validating the version bound.
    ///
    /// The length history is seeded at version 0, so the floor resolves for every version a
    /// validated caller can pass.
    fn length_at(&self, version: Version) -> usize {
        self.lengths.value_at(version).copied().unwrap_or_default()
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

impl<T> Default for VersionedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

// TESTS
// ================================================================================================
