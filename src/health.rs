use serde::Serialize;
use std::time::Instant;

use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub backend: String,
    pub latency_ms: u64,
    pub documents: Option<u64>,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn failed(backend: &str, error: String) -> Self {
        HealthReport {
            ok: false,
            backend: backend.to_string(),
            latency_ms: 0,
            documents: None,
            error: Some(error),
        }
    }
}

/// Ping the store and count documents, timing the round-trip.
pub fn gather(store: &dyn Store) -> HealthReport {
    let start = Instant::now();
    let result = store.ping().and_then(|_| store.count());
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(count) => HealthReport {
            ok: true,
            backend: store.backend().to_string(),
            latency_ms,
            documents: Some(count),
            error: None,
        },
        Err(e) => {
            log::warn!("Health check failed: {}", e);
            HealthReport {
                latency_ms,
                ..HealthReport::failed(store.backend(), e)
            }
        }
    }
}
