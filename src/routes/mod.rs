pub mod api;
pub mod dashboard;
pub mod data;
pub mod health;

use std::sync::Arc;

use chrono::Utc;
use rocket::tokio::task;

use crate::config::DashboardConfig;
use crate::report::{self, Notice, Report};
use crate::store::Store;

/// Run store work on the blocking pool. The mongodb sync driver parks the
/// calling thread and must stay off the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f).await.map_err(|e| e.to_string())
}

/// Build the report for the last `hours` hours as of now.
pub async fn load_report(store: &Arc<dyn Store>, config: &DashboardConfig, hours: u32) -> Report {
    let s = Arc::clone(store);
    let cfg = config.clone();
    match blocking(move || report::build(&*s, &cfg, hours, Utc::now())).await {
        Ok(r) => r,
        Err(e) => {
            log::error!("Report worker failed: {}", e);
            let mut r = Report::empty(hours);
            r.notices
                .push(Notice::warning(format!("Error fetching or processing data: {}", e)));
            r
        }
    }
}
