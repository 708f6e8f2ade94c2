use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::lifecycle::store::StoreError;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Session expired, please sign in again")]
    Unauthorized,
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "Absence request not found")]
    NotFound,
    #[display(fmt = "{}", message)]
    Upstream { status: u16, message: String },
    #[display(fmt = "Absence service unavailable")]
    BadGateway,
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized => ApiError::Unauthorized,
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Rejected { status, message } => ApiError::Upstream {
                status,
                message: if message.is_empty() {
                    "Upstream request failed".to_string()
                } else {
                    message
                },
            },
            StoreError::Transport(_) | StoreError::Decode(_) => ApiError::BadGateway,
        }
    }
}
