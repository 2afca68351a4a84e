use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;

use crate::config::AppConfig;
use crate::report::{self, Report};
use crate::store::Store;

use super::load_report;

/// Same numbers as the dashboard, as JSON.
#[get("/summary?<hours>")]
pub async fn summary(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    hours: Option<&str>,
) -> Json<Report> {
    let (hours, notice) = report::resolve_hours(hours, &config.dashboard);
    let mut report = load_report(store.inner(), &config.dashboard, hours).await;
    if let Some(n) = notice {
        report.notices.insert(0, n);
    }
    Json(report)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![summary]
}
