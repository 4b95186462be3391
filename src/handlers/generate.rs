use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::metrics::{
    AUTH_FAILURES, GENERATED_TOKENS, GENERATION_LATENCY, INFERENCE_FAILURES, REQUEST_TOTAL,
};
use crate::models::{GenerateRequest, GenerateResponse, PromptQuery};
use crate::state::AppState;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PromptQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    // every malformed request is a 422 with a JSON detail
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let Json(body) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let payload = GenerateRequest::from_parts(body, query.prompt)?;

    // secret first, the model never sees unauthorized prompts
    if let Err(err) = state.secret.verify(&payload.secret) {
        AUTH_FAILURES.inc();
        warn!("rejected generate request: invalid secret");
        return Err(err);
    }

    let prompt = payload
        .prompt
        .ok_or_else(|| ApiError::InvalidRequest("prompt is required".to_string()))?;

    let start_time = Instant::now();
    let generator = Arc::clone(&state.generator);
    let params = state.params.clone();
    let prompt_chars = prompt.chars().count();

    // inference is CPU/GPU bound, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || generator.generate(&prompt, &params))
        .await
        .map_err(|e| {
            INFERENCE_FAILURES.inc();
            ApiError::Internal(format!("inference task failed: {e}"))
        })?;

    let elapsed = start_time.elapsed();
    GENERATION_LATENCY.observe(elapsed.as_secs_f64());

    let generation = result.inspect_err(|_| INFERENCE_FAILURES.inc())?;
    GENERATED_TOKENS.inc_by(generation.new_tokens as f64);

    info!(
        prompt_chars,
        new_tokens = generation.new_tokens,
        elapsed_ms = elapsed.as_millis() as u64,
        "generation complete"
    );

    Ok(Json(GenerateResponse {
        generated_text: generation.text,
    }))
}
