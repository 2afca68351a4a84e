use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::DeleteGate;
use crate::config::AppConfig;
use crate::report::{self, Notice};
use crate::store::Store;

use super::load_report;

// ── Dashboard ──────────────────────────────────────────

#[get("/?<hours>")]
pub async fn index(
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    gate: &State<DeleteGate>,
    hours: Option<&str>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let dash = &config.dashboard;
    let (hours, hours_notice) = report::resolve_hours(hours, dash);
    let mut report = load_report(store.inner(), dash, hours).await;

    let mut notices: Vec<Notice> = Vec::new();
    if let Some(ref f) = flash {
        notices.push(Notice::from_flash(f.kind(), f.message()));
    }
    notices.extend(hours_notice);
    notices.append(&mut report.notices);

    let chart_json = report
        .chart
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "null".to_string());

    let context = json!({
        "page_title": "Weather Station Dashboard",
        "notices": notices,
        "selected_hours": hours,
        "allowed_hours": dash.allowed_hours,
        "latest": report.latest,
        "stats": report.stats,
        "rolling": report.rolling,
        "chart_json": chart_json,
        "timezone": dash.timezone,
        "delete_enabled": gate.enabled(),
        "default_days_old": dash.default_days_old,
    });

    Template::render("dashboard", &context)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index]
}
