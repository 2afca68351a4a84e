use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-memory failure counter keyed by caller, e.g. "delete:<ip>".
/// Only failed attempts are recorded; a success clears the key.
pub struct AttemptLimiter {
    max_failures: u64,
    window: Duration,
    failures: Mutex<HashMap<String, Vec<Instant>>>,
}

impl AttemptLimiter {
    pub fn new(max_failures: u64, window: Duration) -> Self {
        AttemptLimiter {
            max_failures: max_failures.max(1),
            window,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True once `key` has used up its failures inside the window. A key
    /// whose failures have all expired is dropped.
    pub fn is_blocked(&self, key: &str) -> bool {
        let mut map = self.entries();
        let cutoff = Instant::now().checked_sub(self.window);
        let live = match map.get_mut(key) {
            Some(attempts) => {
                if let Some(cutoff) = cutoff {
                    attempts.retain(|t| *t > cutoff);
                }
                attempts.len() as u64
            }
            None => return false,
        };
        if live == 0 {
            map.remove(key);
        }
        live >= self.max_failures
    }

    /// Records a failure and sweeps out every key with no live failures.
    pub fn record_failure(&self, key: &str) {
        self.cleanup();
        self.entries().entry(key.to_string()).or_default().push(Instant::now());
    }

    pub fn cleanup(&self) {
        let mut map = self.entries();
        let cutoff = match Instant::now().checked_sub(self.window) {
            Some(c) => c,
            None => return,
        };
        map.retain(|_, attempts| {
            attempts.retain(|t| *t > cutoff);
            !attempts.is_empty()
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.entries().len()
    }

    pub fn clear(&self, key: &str) {
        self.entries().remove(key);
    }

    pub fn window_minutes(&self) -> u64 {
        self.window.as_secs() / 60
    }
}
