//! Ringbuffer module for graph history.
//!
//! This module provides a fixed-size ringbuffer that always reports exactly
//! `capacity` values, oldest first and newest last. Unfilled slots hold the
//! type's default value.

use serde::{Serialize, Serializer};

/// A circular buffer exposed as a fixed-length ordered sequence.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    entries: Vec<T>,
    write_index: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Creates a new ringbuffer with the specified capacity.
    ///
    /// A zero capacity is raised to one so there is always a newest slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![T::default(); capacity.max(1)],
            write_index: 0,
        }
    }

    /// Appends a value, discarding the oldest one.
    pub fn push(&mut self, value: T) {
        self.entries[self.write_index] = value;
        self.write_index = (self.write_index + 1) % self.entries.len();
    }

    /// Iterates values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries[self.write_index..]
            .iter()
            .chain(self.entries[..self.write_index].iter())
    }

    /// Returns all values in chronological order.
    pub fn values(&self) -> Vec<T> {
        self.iter().copied().collect()
    }

    /// The most recently pushed value (or the default before any push).
    pub fn latest(&self) -> T {
        let len = self.entries.len();
        self.entries[(self.write_index + len - 1) % len]
    }

    /// Always equal to the capacity.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Never true; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<T: Copy + Default + Into<f64>> RingBuffer<T> {
    /// Mean over all slots, including not-yet-filled defaults.
    pub fn average(&self) -> f64 {
        let sum: f64 = self.entries.iter().map(|v| (*v).into()).sum();
        sum / self.entries.len() as f64
    }
}

impl<T: Copy + Default + Serialize> Serialize for RingBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
