#![cfg(test)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::Value;

use crate::auth::{hash_password, DeleteGate};
use crate::config::AppConfig;
use crate::models::reading::Reading;
use crate::store::memory::MemoryStore;
use crate::store::Store;

const PASSWORD: &str = "hunter2";

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = "memory".to_string();
    config.dashboard.timezone = "UTC".to_string();
    config
}

/// Three readings inside the last quarter hour: 70, 72, 74 °F.
fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.insert(Reading::new(now - Duration::minutes(10), 70.0));
    store.insert(Reading::new(now - Duration::minutes(5), 72.0));
    store.insert(Reading::new(now - Duration::minutes(1), 74.0));
    store
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_gate() -> DeleteGate {
    DeleteGate::new(Some(hash_password(PASSWORD, 4).unwrap()))
}

fn client_with(store: Arc<MemoryStore>, gate: DeleteGate) -> Client {
    client_with_config(test_config(), store, gate)
}

fn client_with_config(config: AppConfig, store: Arc<MemoryStore>, gate: DeleteGate) -> Client {
    let dyn_store: Arc<dyn Store> = store;
    Client::tracked(crate::build(config, dyn_store, gate)).expect("valid rocket instance")
}

fn get_body(client: &Client, uri: &str) -> String {
    let response = client.get(uri.to_string()).dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_string().unwrap()
}

fn post_delete(client: &Client, hours: &str, body: &str) -> Option<String> {
    let response = client
        .post(format!("/delete_old_data?hours={}", hours))
        .header(ContentType::Form)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    response.headers().get_one("Location").map(str::to_string)
}

// ═══════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════

#[test]
fn dashboard_renders_window_stats() {
    let client = client_with(seeded_store(), fast_gate());
    let body = get_body(&client, "/");

    assert!(body.contains("Latest Reading"));
    assert!(body.contains("74.00 °F"));
    assert!(body.contains("70.00"));
    assert!(body.contains("72.00"));
    // Rolling average over the last 5 minutes: (72 + 74) / 2
    assert!(body.contains("73.00 °F"));
    assert!(body.contains("5-Minute Rolling Average"));
    assert!(body.contains("var graphData = {\"data\":"));
    assert!(body.contains("<option value=\"24\" selected>"));
}

#[test]
fn dashboard_sets_no_cache_headers() {
    let client = client_with(seeded_store(), fast_gate());
    let response = client.get("/").dispatch();
    let cache = response.headers().get_one("Cache-Control").unwrap_or("");
    assert!(cache.contains("no-store"));
}

#[test]
fn dashboard_honours_allowed_hours() {
    let client = client_with(seeded_store(), fast_gate());
    let body = get_body(&client, "/?hours=6");
    assert!(body.contains("<option value=\"6\" selected>"));
    assert!(body.contains("Last 6 Hours Statistics"));
    assert!(!body.contains("Invalid time range"));
}

#[test]
fn dashboard_warns_on_hours_outside_list() {
    let client = client_with(seeded_store(), fast_gate());
    let body = get_body(&client, "/?hours=5");
    assert!(body.contains("Invalid time range. Showing default 24 hours."));
    assert!(body.contains("<option value=\"24\" selected>"));
}

#[test]
fn dashboard_warns_on_non_numeric_hours() {
    let client = client_with(seeded_store(), fast_gate());
    let body = get_body(&client, "/?hours=abc");
    assert!(body.contains("Invalid time range format. Showing default 24 hours."));
}

#[test]
fn dashboard_empty_store() {
    let client = client_with(Arc::new(MemoryStore::new()), fast_gate());
    let body = get_body(&client, "/");
    assert!(body.contains("No recent data available."));
    assert!(body.contains("Not enough data for statistics."));
    assert!(body.contains("var graphData = null;"));
    assert!(!body.contains("Rolling Average"));
}

#[test]
fn dashboard_reports_store_outage() {
    let store = seeded_store();
    store.set_available(false);
    let client = client_with(store, fast_gate());
    let body = get_body(&client, "/");
    assert!(body.contains("Database connection failed. Please check server logs."));
    assert!(body.contains("alert-danger"));
}

#[test]
fn dashboard_hides_delete_form_without_password() {
    let client = client_with(seeded_store(), DeleteGate::new(None));
    let body = get_body(&client, "/");
    assert!(body.contains("id=\"delete-disabled\""));
    assert!(!body.contains("name=\"password\""));
}

// ═══════════════════════════════════════════════════════════
// Delete old data
// ═══════════════════════════════════════════════════════════

#[test]
fn delete_removes_old_readings() {
    let store = seeded_store();
    store.insert(Reading::new(Utc::now() - Duration::days(3), 50.0));
    let client = client_with(store.clone(), fast_gate());

    let location = post_delete(&client, "6", "days_old=2&password=hunter2");
    assert_eq!(location.as_deref(), Some("/?hours=6"));
    assert_eq!(store.count().unwrap(), 3);

    let body = get_body(&client, "/?hours=6");
    assert!(body.contains("Successfully deleted 1 old record(s) older than 2 days."));
    assert!(body.contains("alert-success"));
}

#[test]
fn delete_rejects_wrong_password() {
    let store = seeded_store();
    store.insert(Reading::new(Utc::now() - Duration::days(3), 50.0));
    let client = client_with(store.clone(), fast_gate());

    post_delete(&client, "24", "days_old=1&password=nope");
    assert_eq!(store.count().unwrap(), 4);

    let body = get_body(&client, "/");
    assert!(body.contains("Incorrect password. No data was deleted."));
    assert!(body.contains("alert-danger"));
}

#[test]
fn delete_disabled_without_password() {
    let store = seeded_store();
    store.insert(Reading::new(Utc::now() - Duration::days(3), 50.0));
    let client = client_with(store.clone(), DeleteGate::new(None));

    post_delete(&client, "24", "days_old=1&password=anything");
    assert_eq!(store.count().unwrap(), 4);

    let body = get_body(&client, "/");
    assert!(body.contains("Data deletion is disabled: no delete password is configured."));
}

#[test]
fn delete_validates_days() {
    let client = client_with(seeded_store(), fast_gate());

    post_delete(&client, "24", "days_old=0&password=hunter2");
    let body = get_body(&client, "/");
    assert!(body.contains("Please provide a positive number of days."));
    assert!(body.contains("alert-warning"));

    post_delete(&client, "24", "days_old=abc&password=hunter2");
    let body = get_body(&client, "/");
    assert!(body.contains("Invalid number of days provided."));
}

#[test]
fn delete_redirect_sanitizes_hours() {
    let client = client_with(seeded_store(), fast_gate());
    let location = post_delete(&client, "999", "days_old=1&password=hunter2");
    assert_eq!(location.as_deref(), Some("/?hours=24"));
}

#[test]
fn delete_reports_store_outage() {
    let store = seeded_store();
    store.set_available(false);
    let client = client_with(store, fast_gate());

    post_delete(&client, "24", "days_old=1&password=hunter2");
    let body = get_body(&client, "/");
    assert!(body.contains("Database connection failed. Cannot delete data."));
}

#[test]
fn delete_rate_limits_failed_attempts() {
    let store = seeded_store();
    store.insert(Reading::new(Utc::now() - Duration::days(3), 50.0));
    let client = client_with(store.clone(), fast_gate());

    for _ in 0..5 {
        post_delete(&client, "24", "days_old=1&password=wrong");
    }
    // Even the right password is refused once blocked.
    post_delete(&client, "24", "days_old=1&password=hunter2");
    assert_eq!(store.count().unwrap(), 4);

    let body = get_body(&client, "/");
    assert!(body.contains("Too many failed attempts. Please try again in 15 minutes."));
}

// ═══════════════════════════════════════════════════════════
// JSON endpoints
// ═══════════════════════════════════════════════════════════

#[test]
fn api_summary_matches_dashboard() {
    let client = client_with(seeded_store(), fast_gate());
    let response = client.get("/api/summary?hours=6").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let json: Value = serde_json::from_str(&response.into_string().unwrap()).unwrap();

    assert_eq!(json["hours"], 6);
    assert_eq!(json["stats"]["count"], 3);
    assert_eq!(json["stats"]["min_f"], "70.00");
    assert_eq!(json["stats"]["avg_f"], "72.00");
    assert_eq!(json["stats"]["max_f"], "74.00");
    assert_eq!(json["latest"]["temp_f"], "74.00");
    assert_eq!(json["rolling"]["current_f"], "73.00");
    assert_eq!(json["y_range"], serde_json::json!([68, 76]));
    assert!(json["notices"].as_array().unwrap().is_empty());
}

#[test]
fn api_summary_flags_bad_hours() {
    let client = client_with(seeded_store(), fast_gate());
    let response = client.get("/api/summary?hours=7").dispatch();
    let json: Value = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    assert_eq!(json["hours"], 24);
    assert_eq!(json["notices"][0]["kind"], "warning");
}

#[test]
fn health_ok() {
    let client = client_with(seeded_store(), fast_gate());
    let response = client.get("/health").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let json: Value = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["documents"], 3);
}

#[test]
fn health_unavailable() {
    let store = seeded_store();
    store.set_available(false);
    let client = client_with(store, fast_gate());
    let response = client.get("/health").dispatch();
    assert_eq!(response.status(), Status::ServiceUnavailable);
    let json: Value = serde_json::from_str(&response.into_string().unwrap()).unwrap();
    assert_eq!(json["ok"], false);
    assert!(json["error"].is_string());
}

#[test]
fn unknown_route_uses_catcher() {
    let client = client_with(seeded_store(), fast_gate());
    let response = client.get("/nope").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert!(response.into_string().unwrap().contains("Page not found."));
}

// ═══════════════════════════════════════════════════════════
// Retention
// ═══════════════════════════════════════════════════════════

#[test]
fn retention_task_starts_with_server() {
    let mut config = test_config();
    config.retention.days = 7;
    config.retention.interval_minutes = 60;
    let client = client_with_config(config, seeded_store(), fast_gate());
    let response = client.get("/health").dispatch();
    assert_eq!(response.status(), Status::Ok);
}
