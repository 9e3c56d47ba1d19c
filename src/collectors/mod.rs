//! Collectors module for system-level counters.
//!
//! This module contains readers for block storage usage, network interface
//! statistics, and the battery, thermal and fan sensors.

pub mod netdev;
pub mod sensors;
pub mod storage;
