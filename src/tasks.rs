use chrono::Utc;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, RetentionConfig};
use crate::store::Store;

/// Periodically prunes readings older than `retention.days`. Does nothing
/// when retention is 0.
pub struct RetentionTask;

#[rocket::async_trait]
impl Fairing for RetentionTask {
    fn info(&self) -> Info {
        Info {
            name: "Retention Task",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let retention = match rocket.state::<AppConfig>() {
            Some(c) => c.retention.clone(),
            None => return,
        };
        if retention.days == 0 {
            return;
        }
        let store = match rocket.state::<Arc<dyn Store>>() {
            Some(s) => Arc::clone(s),
            None => {
                log::error!("[task] Store not found in managed state; retention disabled");
                return;
            }
        };

        let days = retention.days;
        let minutes = retention.interval_minutes.max(1);
        let interval = Duration::from_secs(minutes * 60);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let s = Arc::clone(&store);
                let r = retention.clone();
                // The mongodb sync driver blocks; keep it off the async workers.
                match tokio::task::spawn_blocking(move || prune(&*s, &r)).await {
                    Ok(Ok(count)) => {
                        if count > 0 {
                            log::info!("[task] Pruned {} readings older than {} days", count, days);
                        }
                    }
                    Ok(Err(e)) => log::error!("[task] Retention prune failed: {}", e),
                    Err(e) => log::error!("[task] Retention prune panicked: {}", e),
                }
            }
        });

        log::info!(
            "[task] Retention started: keep {} days, every {} min",
            days,
            minutes
        );
    }
}

/// Delete everything older than the retention period, measured from now.
pub fn prune(store: &dyn Store, retention: &RetentionConfig) -> Result<u64, String> {
    let days = chrono::Duration::try_days(i64::from(retention.days))
        .ok_or_else(|| format!("retention of {} days is out of range", retention.days))?;
    let cutoff = Utc::now()
        .checked_sub_signed(days)
        .ok_or_else(|| format!("retention of {} days is out of range", retention.days))?;
    store.ensure_connected()?;
    store.delete_older_than(cutoff)
}
