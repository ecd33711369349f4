use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// "ready" when every required broker variable is set
    pub config: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Broker health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let config_status = match state.config.require() {
        Ok(_) => "ready".to_string(),
        Err(e) => e.to_string(),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        config: config_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
