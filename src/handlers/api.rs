use super::AppState;
use crate::errors::{ApiError, ApiResult, GenerationError};
use crate::models::generation::{GenerationResult, MoodboardRequest, PreviewRequest};
use crate::services::prompt;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

pub async fn moodboard(
    State(state): State<AppState>,
    payload: Result<Json<MoodboardRequest>, JsonRejection>,
) -> ApiResult<Json<GenerationResult>> {
    let Json(req) = payload.map_err(invalid_body)?;
    let prompt = prompt::moodboard_prompt(&req)?;
    ensure_configured(&state)?;

    generate(&state, "moodboard", &prompt).await
}

pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> ApiResult<Json<GenerationResult>> {
    let Json(req) = payload.map_err(invalid_body)?;
    let prompt = prompt::preview_prompt(&req)?;
    ensure_configured(&state)?;

    generate(&state, "preview", &prompt).await
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge("Request body too large".to_string());
    }
    ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
}

fn ensure_configured(state: &AppState) -> ApiResult<()> {
    if state.generator.is_configured() {
        Ok(())
    } else {
        error!("GEMINI_API_KEY not configured");
        Err(ApiError::Configuration("GEMINI_API_KEY not configured".to_string()))
    }
}

async fn generate(
    state: &AppState,
    kind: &'static str,
    prompt: &str,
) -> ApiResult<Json<GenerationResult>> {
    info!(kind, model = state.generator.model(), prompt_chars = prompt.len(), "Generating image");

    match state.generator.generate_image(prompt).await {
        Ok(image) => {
            info!(kind, mime_type = %image.mime_type, "Image generated");
            Ok(Json(image))
        }
        Err(GenerationError::Provider { status, message }) => {
            error!(kind, status, error = %message, "Provider rejected generation request");
            Err(GenerationError::Provider { status, message }.into())
        }
        Err(e) => {
            error!(kind, error = %e, "Image generation failed");
            Err(e.into())
        }
    }
}
