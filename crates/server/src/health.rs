use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use procura_core::{Catalogs, SessionRegistry};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub catalogs: Arc<Catalogs>,
    pub sessions: Arc<SessionRegistry>,
    pub llm_endpoint: String,
    pub llm_model: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalogs: HealthCheck,
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalogs = catalog_check(&state.catalogs);
    let llm = llm_check(&state.llm_endpoint, &state.llm_model);
    let ready = catalogs.status == "ready" && llm.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("procura-server running with {} open sessions", state.sessions.len()),
        },
        catalogs,
        llm,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(catalogs: &Catalogs) -> HealthCheck {
    let detail = format!(
        "{} products, {} suppliers, {} companies",
        catalogs.products.len(),
        catalogs.suppliers.len(),
        catalogs.companies.len()
    );
    let empty =
        catalogs.products.is_empty() || catalogs.suppliers.is_empty() || catalogs.companies.is_empty();
    HealthCheck { status: if empty { "degraded" } else { "ready" }, detail }
}

// Configuration only; the endpoint is not called.
fn llm_check(endpoint: &str, model: &str) -> HealthCheck {
    if endpoint.trim().is_empty() || model.trim().is_empty() {
        return HealthCheck { status: "degraded", detail: "llm endpoint is not configured".to_string() };
    }
    HealthCheck { status: "ready", detail: format!("model `{model}` at {endpoint}") }
}
