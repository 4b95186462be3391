use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Failures coming out of the model backend
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("model hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model files: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Model(String),
}

// Errors returned to HTTP callers as {"detail": "..."}
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid secret")]
    Unauthorized,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Generation failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidRequest("missing prompt".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(InferenceError::Model("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_detail_is_stable() {
        assert_eq!(ApiError::Unauthorized.to_string(), "Invalid secret");
    }

    #[test]
    fn inference_detail_carries_the_cause() {
        let err = ApiError::from(InferenceError::Tokenizer("bad merges".into()));
        assert_eq!(err.to_string(), "Generation failed: tokenizer error: bad merges");
    }
}
