use crate::AppState;
use crate::api::error::AppError;
use crate::models::BrokerResponse;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Temporary credentials scoped to the upload prefix", body = BrokerResponse),
        (status = 500, description = "Broker configuration missing", body = crate::models::ErrorBody),
        (status = 502, description = "STS rejected the AssumeRole call", body = crate::models::ErrorBody)
    ),
    tag = "credentials"
)]
pub async fn issue_credentials(
    State(state): State<AppState>,
) -> Result<Json<BrokerResponse>, AppError> {
    let res = state.broker.issue(&state.config).await?;
    Ok(Json(res))
}
