//! Liveness endpoint
//!
//! `GET /health` answers as long as the process serves requests. The most
//! recent failed migration is echoed so an operator can spot a dead scraper
//! or storage service without reading logs.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

const SERVICE_NAME: &str = "harbor-migrate";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Message of the last failed migration since startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn uptime_seconds(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started).num_seconds()).unwrap_or(0)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "ok",
        module: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime_seconds(state.startup_time, Utc::now()),
        last_error,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_uptime_never_negative() {
        let now = Utc::now();
        assert_eq!(uptime_seconds(now - Duration::seconds(90), now), 90);
        // Clock stepped backwards
        assert_eq!(uptime_seconds(now + Duration::seconds(5), now), 0);
    }
}
