use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::handlers::form::read_form;
use crate::handlers::request_language;
use crate::handlers::responses::{success, ApiError};
use crate::models::ImageGenerationRequest;
use crate::pipeline::{generate_outfit_image, prepare_photo};
use crate::state::AppState;
use crate::utils::language::Language;
use crate::utils::timing::start_request_timer;

const REQUIRED_FIELDS: &[&str] = &["bodyInfo", "styleOptions", "tpo", "stylingTips", "colorPalette"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Generate Coordinate Image API is running" }))
}

pub async fn create(State(state): State<AppState>, request: Request) -> Response {
    let language = request_language(request.headers());
    let mut timer = start_request_timer("POST /api/generate-coordinate-image", language.code());

    match run(&state, request, language).await {
        Ok(image) => success(image),
        Err(error) => {
            timer.mark_status("error", Some(error.code().to_string()));
            error.localized(language).into_response()
        }
    }
}

async fn run(
    state: &AppState,
    request: Request,
    language: Language,
) -> Result<GeneratedImage, ApiError> {
    let max_file_size = state.config.max_file_size;
    let mut form = read_form(request, state, max_file_size).await?;
    form.require(REQUIRED_FIELDS)?;
    let image_request: ImageGenerationRequest = form.deserialize()?;
    image_request
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    let reference = match form.accept_upload(max_file_size)? {
        Some(upload) => Some(prepare_photo(upload, state.compression_options()).await),
        None => None,
    };
    let image_url = generate_outfit_image(
        state.gateway.as_ref(),
        &image_request,
        reference,
        language,
    )
    .await?;
    Ok(GeneratedImage { image_url })
}
