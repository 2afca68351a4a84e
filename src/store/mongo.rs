use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, FindOneOptions, FindOptions};
use mongodb::sync::{Client, Collection, Database};

use crate::models::reading::{PartialReading, Reading};

use super::Store;

/// MongoDB-backed implementation of the Store trait.
pub struct MongoStore {
    db: Database,
    readings: Collection<Document>,
    /// Cleared on any driver error so the next request re-pings.
    healthy: AtomicBool,
}

impl MongoStore {
    /// Create a client for `uri` and bind the readings collection. Does not
    /// contact the server; call `ping` for that.
    pub fn new(
        uri: &str,
        db_name: &str,
        collection: &str,
        server_selection_timeout: Duration,
    ) -> Result<Self, String> {
        let mut client_options = ClientOptions::parse(uri).map_err(|e| {
            format!("MongoDB configuration error: {} (check the URI format)", e)
        })?;
        client_options.server_selection_timeout = Some(server_selection_timeout);
        client_options.app_name = Some("thermoboard".to_string());
        let client = Client::with_options(client_options).map_err(|e| e.to_string())?;
        let db = client.database(db_name);
        let readings = db.collection::<Document>(collection);
        Ok(Self {
            db,
            readings,
            healthy: AtomicBool::new(false),
        })
    }

    fn track<T>(&self, result: mongodb::error::Result<T>) -> Result<T, String> {
        result.map_err(|e| {
            self.healthy.store(false, Ordering::SeqCst);
            e.to_string()
        })
    }
}

fn bson_time(ts: DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(ts.timestamp_millis())
}

impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    fn ping(&self) -> Result<(), String> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .map_err(|e| {
                self.healthy.store(false, Ordering::SeqCst);
                format!(
                    "MongoDB connection failed: {} (check URI, credentials, network and cluster status)",
                    e
                )
            })?;
        self.healthy.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), String> {
        if self.healthy.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.ping()
    }

    fn latest_reading(&self) -> Result<Option<PartialReading>, String> {
        let opts = FindOneOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .build();
        let found = self.track(self.readings.find_one(None, opts))?;
        Ok(found.as_ref().map(PartialReading::from_document))
    }

    fn readings_since(&self, start: DateTime<Utc>) -> Result<Vec<Reading>, String> {
        let filter = doc! { "timestamp": { "$gte": bson_time(start) } };
        let opts = FindOptions::builder()
            .projection(doc! { "timestamp": 1, "average_temp_f": 1, "_id": 0 })
            .sort(doc! { "timestamp": 1 })
            .build();
        let cursor = self.track(self.readings.find(filter, opts))?;

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for item in cursor {
            let d = self.track(item)?;
            match Reading::from_document(&d) {
                Some(r) => rows.push(r),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!("Dropped {} unusable reading(s) since {}", dropped, start);
        }
        Ok(rows)
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, String> {
        let filter = doc! { "timestamp": { "$lt": bson_time(cutoff) } };
        let result = self.track(self.readings.delete_many(filter, None))?;
        Ok(result.deleted_count)
    }

    fn count(&self) -> Result<u64, String> {
        self.track(self.readings.estimated_document_count(None))
    }
}
