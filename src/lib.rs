pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::BrokerConfig;
use crate::services::broker::CredentialBroker;
use axum::{Router, middleware::from_fn, routing::get};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::credentials::issue_credentials,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::BrokerResponse,
            models::TemporaryCredentials,
            models::AssumedIdentity,
            models::ErrorBody,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "credentials", description = "Scoped upload credentials"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<CredentialBroker>,
    pub config: BrokerConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::credentials::issue_credentials))
        .route("/health", get(api::handlers::health::health_check))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
