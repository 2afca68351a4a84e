use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::DatabaseConfig;
use crate::models::reading::{PartialReading, Reading};

pub mod memory;
pub mod mongo;

/// Data-access seam for the telemetry collection.
/// Implementations: `MongoStore` (wraps the mongodb sync driver) and
/// `MemoryStore` (in-process, for local runs and tests).
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Round-trip to the server.
    fn ping(&self) -> Result<(), String>;

    /// Cheap check before serving a request. Backends that track connection
    /// state only ping when they last saw a failure.
    fn ensure_connected(&self) -> Result<(), String> {
        self.ping()
    }

    /// Newest document by timestamp, fields coerced independently.
    fn latest_reading(&self) -> Result<Option<PartialReading>, String>;

    /// Readings with `timestamp >= start`, ascending, unusable rows dropped.
    fn readings_since(&self, start: DateTime<Utc>) -> Result<Vec<Reading>, String>;

    /// Remove readings with `timestamp < cutoff`; returns how many went.
    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, String>;

    fn count(&self) -> Result<u64, String>;
}

/// Open the configured backend. Only configuration errors fail here.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>, String> {
    match config.backend.as_str() {
        "mongodb" => {
            let uri = config
                .uri
                .as_deref()
                .ok_or_else(|| "MongoDB URI is not configured".to_string())?;
            log::info!("Connecting to MongoDB...");
            let store = mongo::MongoStore::new(
                uri,
                &config.name,
                &config.collection,
                Duration::from_millis(config.server_selection_timeout_ms),
            )?;
            // An unreachable server is not fatal: requests re-ping and
            // the dashboard reports the outage.
            match store.ping() {
                Ok(()) => log::info!(
                    "Connected to MongoDB - DB: '{}', Collection: '{}'",
                    config.name,
                    config.collection
                ),
                Err(e) => log::error!("{}", e),
            }
            Ok(Arc::new(store) as Arc<dyn Store>)
        }
        "memory" => {
            log::warn!("Using in-memory store; readings are not persisted");
            Ok(Arc::new(memory::MemoryStore::new()) as Arc<dyn Store>)
        }
        other => Err(format!("Unknown database backend '{}'", other)),
    }
}
