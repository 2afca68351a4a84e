use std::sync::Arc;

use chrono::{Duration, Utc};
use rocket::form::Form;
use rocket::response::{Flash, Redirect};
use rocket::State;

use crate::auth::{ClientIp, DeleteGate, GateDecision};
use crate::config::AppConfig;
use crate::rate_limit::AttemptLimiter;
use crate::report;
use crate::store::Store;

use super::blocking;

#[derive(Debug, FromForm)]
pub struct DeleteForm {
    pub days_old: Option<String>,
    pub password: Option<String>,
}

// ── Bulk delete ────────────────────────────────────────

/// Remove readings older than `days_old` days. Always redirects back to the
/// dashboard at the window the user was looking at.
#[post("/delete_old_data?<hours>", data = "<form>")]
pub async fn delete_old_data(
    form: Form<DeleteForm>,
    hours: Option<&str>,
    store: &State<Arc<dyn Store>>,
    config: &State<AppConfig>,
    gate: &State<DeleteGate>,
    limiter: &State<AttemptLimiter>,
    client_ip: ClientIp,
) -> Flash<Redirect> {
    let (hours, _) = report::resolve_hours(hours, &config.dashboard);
    let back = Redirect::to(format!("/?hours={}", hours));
    let rate_key = format!("delete:{}", client_ip.0);

    if limiter.is_blocked(&rate_key) {
        return Flash::error(
            back,
            format!(
                "Too many failed attempts. Please try again in {} minutes.",
                limiter.window_minutes()
            ),
        );
    }

    let candidate = form.password.clone().unwrap_or_default();
    let g = gate.inner().clone();
    let decision = blocking(move || g.check(&candidate))
        .await
        .unwrap_or(GateDecision::Denied);

    match decision {
        GateDecision::Disabled => {
            return Flash::error(
                back,
                "Data deletion is disabled: no delete password is configured.",
            );
        }
        GateDecision::Denied => {
            limiter.record_failure(&rate_key);
            log::warn!("Rejected delete attempt from {}: bad password", client_ip.0);
            return Flash::error(back, "Incorrect password. No data was deleted.");
        }
        GateDecision::Granted => limiter.clear(&rate_key),
    }

    let raw_days = form.days_old.as_deref().map(str::trim).unwrap_or("0");
    let days_old = match raw_days.parse::<i64>() {
        Ok(d) => d,
        Err(_) => return Flash::error(back, "Invalid number of days provided."),
    };
    if days_old <= 0 {
        return Flash::warning(back, "Please provide a positive number of days.");
    }
    let cutoff = match Duration::try_days(days_old)
        .and_then(|d| Utc::now().checked_sub_signed(d))
    {
        Some(c) => c,
        None => return Flash::error(back, "Invalid number of days provided."),
    };

    log::info!(
        "Deleting documents older than {} days (before {})",
        days_old,
        cutoff.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let s = Arc::clone(store.inner());
    let outcome = blocking(move || {
        s.ensure_connected().map_err(DeleteFailure::Connection)?;
        s.delete_older_than(cutoff).map_err(DeleteFailure::Query)
    })
    .await;

    match outcome {
        Ok(Ok(deleted)) => {
            log::info!("Deletion successful. {} records removed.", deleted);
            Flash::success(
                back,
                format!(
                    "Successfully deleted {} old record(s) older than {} days.",
                    deleted, days_old
                ),
            )
        }
        Ok(Err(DeleteFailure::Connection(e))) => {
            log::error!("{}", e);
            Flash::error(back, "Database connection failed. Cannot delete data.")
        }
        Ok(Err(DeleteFailure::Query(e))) | Err(e) => {
            log::error!("Error deleting data: {}", e);
            Flash::error(back, format!("An error occurred while deleting data: {}", e))
        }
    }
}

enum DeleteFailure {
    Connection(String),
    Query(String),
}

pub fn routes() -> Vec<rocket::Route> {
    routes![delete_old_data]
}
