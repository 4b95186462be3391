use axum::{Json, response::IntoResponse};

// fixed greeting, independent of model state
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "Hello": "World!" }))
}
