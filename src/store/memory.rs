use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::models::reading::{PartialReading, Reading};

use super::Store;

/// Process-local store. Readings are kept sorted by timestamp.
pub struct MemoryStore {
    readings: RwLock<Vec<Reading>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            readings: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn insert(&self, reading: Reading) {
        let mut rows = self.readings.write().unwrap_or_else(|e| e.into_inner());
        let pos = rows.partition_point(|r| r.timestamp <= reading.timestamp);
        rows.insert(pos, reading);
    }

    /// Simulate the server going away.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), String> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err("memory store unavailable".to_string())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> Result<(), String> {
        self.check()
    }

    fn latest_reading(&self) -> Result<Option<PartialReading>, String> {
        self.check()?;
        let rows = self.readings.read().map_err(|e| e.to_string())?;
        Ok(rows.last().copied().map(PartialReading::from))
    }

    fn readings_since(&self, start: DateTime<Utc>) -> Result<Vec<Reading>, String> {
        self.check()?;
        let rows = self.readings.read().map_err(|e| e.to_string())?;
        let from = rows.partition_point(|r| r.timestamp < start);
        Ok(rows[from..].to_vec())
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, String> {
        self.check()?;
        let mut rows = self.readings.write().map_err(|e| e.to_string())?;
        let before = rows.len();
        rows.retain(|r| r.timestamp >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    fn count(&self) -> Result<u64, String> {
        self.check()?;
        let rows = self.readings.read().map_err(|e| e.to_string())?;
        Ok(rows.len() as u64)
    }
}
