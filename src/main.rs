#[macro_use]
extern crate rocket;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod auth;
mod boot;
mod chart;
mod config;
mod health;
mod models;
mod rate_limit;
mod report;
mod routes;
mod stats;
mod store;
mod tasks;
mod tests;

use auth::DeleteGate;
use config::AppConfig;
use rate_limit::AttemptLimiter;
use store::Store;

/// Dashboard numbers change with every reading; never let a proxy or the
/// browser serve a stale page.
pub struct NoCache;

#[rocket::async_trait]
impl Fairing for NoCache {
    fn info(&self) -> Info {
        Info { name: "No-Cache Dashboard", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, _req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
        res.set_header(Header::new("Pragma", "no-cache"));
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Dashboard</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p><a href='/'>← Dashboard</a></body></html>".to_string())
}

/// Assemble the server around an already opened store. Split from `rocket()`
/// so tests can launch it against the memory backend.
pub fn build(config: AppConfig, store: Arc<dyn Store>, gate: DeleteGate) -> Rocket<Build> {
    let limiter = AttemptLimiter::new(
        config.security.max_delete_attempts,
        Duration::from_secs(config.security.attempt_window_minutes * 60),
    );

    rocket::build()
        .manage(store)
        .manage(gate)
        .manage(limiter)
        .manage(config)
        .attach(Template::fairing())
        .attach(NoCache)
        .attach(tasks::RetentionTask)
        .mount("/", routes::dashboard::routes())
        .mount("/", routes::data::routes())
        .mount("/", routes::health::routes())
        .mount("/api", routes::api::routes())
        .register("/", catchers![not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: templates present, config file located
    boot::run();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let store = match store::connect(&config.database) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    let gate = match DeleteGate::from_config(&config.security, bcrypt::DEFAULT_COST) {
        Ok(g) => g,
        Err(e) => {
            log::error!("Failed to prepare delete password: {}", e);
            process::exit(1);
        }
    };

    log::info!(
        "Dashboard ready: backend={}, timezone={}, default window={}h",
        store.backend(),
        config.dashboard.timezone,
        config.dashboard.default_hours
    );

    build(config, store, gate)
}
