use crate::models::ErrorBody;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub use crate::error::AppError;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MissingConfig(_) | AppError::InvalidConfig(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_configuration() {
            tracing::error!("Configuration error: {}", self);
        }

        let msg = match &self {
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {:#}", e);
                format!("{:#}", e)
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                "Internal Server Error".to_string()
            }
            AppError::MissingConfig(_) | AppError::InvalidConfig(_) | AppError::InvalidInput(_) => {
                self.to_string()
            }
        };

        (status, Json(ErrorBody { msg })).into_response()
    }
}
