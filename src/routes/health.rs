use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::health::{self, HealthReport};
use crate::store::Store;

use super::blocking;

#[get("/health")]
pub async fn health_check(store: &State<Arc<dyn Store>>) -> (Status, Json<HealthReport>) {
    let s = Arc::clone(store.inner());
    let backend = s.backend();
    let report = match blocking(move || health::gather(&*s)).await {
        Ok(r) => r,
        Err(e) => HealthReport::failed(backend, e),
    };
    let status = if report.ok {
        Status::Ok
    } else {
        Status::ServiceUnavailable
    };
    (status, Json(report))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health_check]
}
