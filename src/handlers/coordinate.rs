use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::handlers::form::read_form;
use crate::handlers::request_language;
use crate::handlers::responses::{success, ApiError};
use crate::models::{CoordinateRequest, CoordinateResult};
use crate::pipeline::{analyze, prepare_photo};
use crate::state::AppState;
use crate::utils::timing::start_request_timer;

const REQUIRED_FIELDS: &[&str] = &["bodyInfo", "styleOptions", "tpo"];

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Coordinate API is running" }))
}

pub async fn create(State(state): State<AppState>, request: Request) -> Response {
    let language = request_language(request.headers());
    let mut timer = start_request_timer("POST /api/coordinate", language.code());

    match run(&state, request).await {
        Ok(result) => success(result),
        Err(error) => {
            timer.mark_status("error", Some(error.code().to_string()));
            error.localized(language).into_response()
        }
    }
}

async fn run(state: &AppState, request: Request) -> Result<CoordinateResult, ApiError> {
    let max_file_size = state.config.max_file_size;
    let mut form = read_form(request, state, max_file_size).await?;
    form.require(REQUIRED_FIELDS)?;
    let coordinate: CoordinateRequest = form.deserialize()?;
    coordinate
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    // A multipart submission is the photo variant, so the file is mandatory there.
    let photo = if form.multipart {
        let upload = form
            .accept_upload(max_file_size)?
            .ok_or(ApiError::MissingFile)?;
        info!(
            "Photo accepted: mime={} bytes={} name={}",
            upload.image.mime_type,
            upload.image.bytes.len(),
            upload.file_name.as_deref().unwrap_or("-")
        );
        Some(prepare_photo(upload, state.compression_options()).await)
    } else {
        None
    };

    Ok(analyze(state.gateway.as_ref(), &coordinate, photo).await?)
}
