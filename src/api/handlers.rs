//! Axum request handlers for the HTTP API.
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::models::ImageResult;
use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};

pub async fn root() -> &'static str {
    "Prompt relay is running!"
}

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ImageResult>> {
    let span = tracing::info_span!("generate_image", request_id = %Uuid::new_v4());
    async move {
        let prompt = extract_prompt(payload)?;
        tracing::info!("Received request for prompt: '{}'", prompt);

        let prompt = if state.enhance_prompt {
            let enhanced = state
                .openai_client
                .enhance_prompt(&prompt)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to enhance prompt: {}", e);
                    AppError::Enhancement(Box::new(e))
                })?;
            tracing::info!("Enhanced prompt: {}", enhanced);
            enhanced
        } else {
            prompt
        };

        match state.openai_client.generate_image(&prompt).await {
            Ok(image_url) => {
                tracing::info!("Image generated");
                Ok(Json(ImageResult { image_url }))
            }
            Err(e) => {
                tracing::error!("Image generation failed: {}", e);
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Pull a non-empty string `prompt` out of the request body.
fn extract_prompt(payload: Result<Json<Value>, JsonRejection>) -> AppResult<String> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection);
        match rejection {
            JsonRejection::BytesRejection(r) => AppError::RequestBody {
                status: r.status(),
                message: r.body_text(),
            },
            _ => AppError::Validation("Request body must be JSON".to_string()),
        }
    })?;

    body.get("prompt")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::Validation("Field 'prompt' is missing from the JSON body".to_string()))
}
