use std::borrow::Cow;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{Config, ModelEndpoint};
use crate::llm::gateway::{GatewayError, ImageRequest, ModelGateway, TextRequest};
use crate::llm::media::InlineImage;
use crate::utils::timing::log_llm_timing;

const IMAGE_TEMPERATURE: f32 = 0.4;
const IMAGE_TOP_K: i32 = 32;
const IMAGE_TOP_P: f32 = 1.0;
const IMAGE_MAX_OUTPUT_TOKENS: i32 = 8192;
const GENERATIVE_LANGUAGE_ORIGIN: &str = "https://generativelanguage.googleapis.com";
const LOG_PREVIEW_CHARS: usize = 200;
const LOG_ERROR_BODY_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Clone, Copy)]
enum ModelKind {
    Text,
    Image,
}

/// Gemini reached through Vertex AI or the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: Client,
    endpoint: ModelEndpoint,
    base_url: Option<String>,
    text_model: String,
    image_model: String,
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: i32,
}

impl GeminiGateway {
    pub fn new(config: &Config, client: Client) -> Self {
        GeminiGateway {
            client,
            endpoint: config.model_endpoint.clone(),
            base_url: config.gemini_base_url.clone(),
            text_model: config.gemini_model.clone(),
            image_model: config.gemini_image_model.clone(),
            temperature: config.gemini_temperature,
            top_k: config.gemini_top_k,
            top_p: config.gemini_top_p,
            max_output_tokens: config.gemini_max_output_tokens,
        }
    }

    fn model_name(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Text => &self.text_model,
            ModelKind::Image => &self.image_model,
        }
    }

    fn provider_label(&self) -> &'static str {
        match self.endpoint {
            ModelEndpoint::Vertex { .. } => "vertex",
            _ => "gemini",
        }
    }

    fn authorized_request(&self, kind: ModelKind) -> Result<RequestBuilder, GatewayError> {
        let model = self.model_name(kind);
        match &self.endpoint {
            ModelEndpoint::Vertex {
                project,
                location,
                image_location,
                access_token,
            } => {
                let location = match kind {
                    ModelKind::Text => location,
                    ModelKind::Image => image_location,
                };
                let url =
                    vertex_generate_url(self.base_url.as_deref(), project, location, model);
                Ok(self.client.post(url).bearer_auth(access_token))
            }
            ModelEndpoint::GenerativeLanguage { api_key } => {
                let origin = self
                    .base_url
                    .as_deref()
                    .unwrap_or(GENERATIVE_LANGUAGE_ORIGIN);
                let url = format!("{origin}/v1beta/models/{model}:generateContent");
                Ok(self.client.post(url).header("x-goog-api-key", api_key))
            }
            ModelEndpoint::Unconfigured { reason } => Err(GatewayError::NotConfigured(*reason)),
        }
    }

    async fn call_api(&self, kind: ModelKind, payload: Value) -> Result<GeminiResponse, GatewayError> {
        let request = self.authorized_request(kind)?;
        let model = self.model_name(kind);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(&payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let response = request.json(&payload).send().await.map_err(|err| {
            warn!(
                "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                err,
                err.is_timeout(),
                err.is_connect(),
                err.status()
            );
            GatewayError::Request(err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let value = response
            .json::<GeminiResponse>()
            .await
            .map_err(|err| GatewayError::Request(format!("invalid response body: {err}")))?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let response_summary = summarize_gemini_response(&value);
            debug!(target: "llm.gemini", model = model, response = %response_summary);
        }
        Ok(value)
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn generate_text(&self, request: TextRequest) -> Result<String, GatewayError> {
        let parts = build_gemini_parts(&request.prompt, request.image.as_ref());
        let payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": self.top_k,
                "topP": self.top_p,
                "maxOutputTokens": self.max_output_tokens,
            },
        });

        let metadata = json!({ "withPhoto": request.image.is_some() });
        log_llm_timing(
            self.provider_label(),
            &self.text_model,
            "coordinate_analysis",
            Some(metadata),
            || async move {
                let response = self.call_api(ModelKind::Text, payload).await?;
                let text = extract_text_from_response(response);
                if text.trim().is_empty() {
                    return Err(GatewayError::EmptyResponse);
                }
                Ok(text)
            },
        )
        .await
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<InlineImage, GatewayError> {
        let parts = build_gemini_parts(&request.prompt, request.reference.as_ref());
        let payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": IMAGE_TEMPERATURE,
                "topK": IMAGE_TOP_K,
                "topP": IMAGE_TOP_P,
                "maxOutputTokens": IMAGE_MAX_OUTPUT_TOKENS,
                "candidateCount": 1,
                "responseModalities": ["TEXT", "IMAGE"],
            },
        });

        let metadata = json!({ "withReference": request.reference.is_some() });
        log_llm_timing(
            self.provider_label(),
            &self.image_model,
            "coordinate_image",
            Some(metadata),
            || async move {
                let response = self.call_api(ModelKind::Image, payload).await?;
                extract_image_from_response(response)
                    .ok_or_else(|| GatewayError::NoImage(self.image_model.clone()))
            },
        )
        .await
    }
}

fn vertex_generate_url(origin: Option<&str>, project: &str, location: &str, model: &str) -> String {
    let origin = match origin {
        Some(origin) => origin.to_string(),
        None if location == "global" => "https://aiplatform.googleapis.com".to_string(),
        None => format!("https://{location}-aiplatform.googleapis.com"),
    };
    format!(
        "{origin}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
    )
}

fn build_gemini_parts(prompt: &str, image: Option<&InlineImage>) -> Vec<Value> {
    let mut parts = Vec::new();
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.to_base64()
            }
        }));
    }
    parts.push(json!({ "text": prompt }));
    parts
}

/// First `limit` characters of `value`, marked when something was cut.
fn clip(value: &str, limit: usize) -> Cow<'_, str> {
    match value.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}... (truncated)", &value[..cut])),
        None => Cow::Borrowed(value),
    }
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let mut summarized_contents = Vec::new();
        for content in contents {
            let parts = content
                .get("parts")
                .and_then(|value| value.as_array())
                .map(|parts| {
                    parts
                        .iter()
                        .map(|part| {
                            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                                json!({ "text": clip(text, LOG_PREVIEW_CHARS) })
                            } else if let Some(inline_data) = part.get("inlineData") {
                                let mime_type = inline_data
                                    .get("mimeType")
                                    .and_then(|value| value.as_str())
                                    .unwrap_or("unknown");
                                let data_len = inline_data
                                    .get("data")
                                    .and_then(|value| value.as_str())
                                    .map(|value| value.len())
                                    .unwrap_or(0);
                                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
                            } else {
                                json!({ "unknownPart": true })
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            summarized_contents.push(json!({ "parts": parts }));
        }
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    for candidate in response.candidates.as_deref().unwrap_or(&[]) {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(clip(text, LOG_PREVIEW_CHARS).into_owned());
                    }
                }
                GeminiPart::InlineData { .. } => image_parts += 1,
                GeminiPart::Other(_) => {}
            }
        }
    }

    json!({
        "candidates": response.candidates.as_ref().map(|candidates| candidates.len()).unwrap_or(0),
        "textParts": text_parts,
        "inlineParts": image_parts,
        "textPreview": text_preview
    })
}

/// Maps a non-success reply to `GatewayError::Status`. The detail is the API's own
/// `error.message` when the body carries one, otherwise a clipped copy of the body.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let body = body.trim();
    let parsed = serde_json::from_str::<Value>(body).ok();
    let api_message = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let logged = match &parsed {
        Some(value) => clip(&value.to_string(), LOG_ERROR_BODY_CHARS).into_owned(),
        None if body.is_empty() => "empty response body".to_string(),
        None => clip(body, LOG_ERROR_BODY_CHARS).into_owned(),
    };
    warn!("Gemini API error: status={}, body={}", status, logged);

    GatewayError::Status {
        status: status.as_u16(),
        detail: api_message.unwrap_or(logged),
    }
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut text_parts = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            if let GeminiPart::Text { text } = part {
                if !text.trim().is_empty() {
                    text_parts.push(text);
                }
            }
        }
    }
    text_parts.join("\n")
}

fn extract_image_from_response(response: GeminiResponse) -> Option<InlineImage> {
    for candidate in response.candidates.unwrap_or_default() {
        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            let GeminiPart::InlineData { inline_data } = part else {
                continue;
            };
            let mime_type = inline_data
                .mime_type
                .filter(|mime| mime.starts_with("image/"))
                .unwrap_or_else(|| "image/png".to_string());
            match general_purpose::STANDARD.decode(inline_data.data.trim()) {
                Ok(bytes) if !bytes.is_empty() => return Some(InlineImage::new(bytes, mime_type)),
                Ok(_) => warn!("Gemini returned an empty inline image part"),
                Err(err) => warn!("Gemini returned undecodable inline image data: {}", err),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: Value) -> GeminiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn joins_non_empty_text_parts() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "first" },
                { "text": "  " },
                { "thoughtSignature": "abc" },
                { "text": "second" }
            ]}}]
        }));
        assert_eq!(extract_text_from_response(parsed), "first\nsecond");
    }

    #[test]
    fn missing_candidates_give_empty_text() {
        assert_eq!(extract_text_from_response(response(json!({}))), "");
    }

    #[test]
    fn extracts_first_inline_image() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/jpeg", "data": "AQID" } }
            ]}}]
        }));
        let image = extract_image_from_response(parsed).unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn image_parts_without_mime_default_to_png() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "data": "AQID" } }
            ]}}]
        }));
        assert_eq!(extract_image_from_response(parsed).unwrap().mime_type, "image/png");
    }

    #[test]
    fn text_only_reply_has_no_image() {
        let parsed = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "I can't draw that" },
                { "inlineData": { "mimeType": "image/png", "data": "" } }
            ]}}]
        }));
        assert!(extract_image_from_response(parsed).is_none());
        assert!(extract_image_from_response(response(json!({ "candidates": [] }))).is_none());
    }

    #[test]
    fn photo_precedes_prompt_text() {
        let image = InlineImage::new(vec![9, 9], "image/jpeg");
        let parts = build_gemini_parts("analyse", Some(&image));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["text"], "analyse");
    }

    #[test]
    fn vertex_urls_use_regional_hosts() {
        assert_eq!(
            vertex_generate_url(None, "proj", "asia-northeast3", "gemini-2.5-flash"),
            "https://asia-northeast3-aiplatform.googleapis.com/v1/projects/proj/locations/asia-northeast3/publishers/google/models/gemini-2.5-flash:generateContent"
        );
        assert!(vertex_generate_url(None, "proj", "global", "m")
            .starts_with("https://aiplatform.googleapis.com/"));
        assert!(vertex_generate_url(Some("http://127.0.0.1:9"), "proj", "global", "m")
            .starts_with("http://127.0.0.1:9/v1/projects/proj/"));
    }

    #[test]
    fn status_detail_prefers_api_message() {
        let err = status_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"quota exceeded"}}"#,
        );
        assert!(matches!(
            err,
            GatewayError::Status { status: 429, ref detail } if detail == "quota exceeded"
        ));

        let err = status_error(StatusCode::BAD_GATEWAY, "   ");
        assert!(matches!(
            err,
            GatewayError::Status { status: 502, ref detail } if detail == "empty response body"
        ));
    }

    #[test]
    fn clip_marks_cut_text_on_char_boundaries() {
        assert_eq!(clip("짧은", 5), "짧은");
        assert_eq!(clip("가나다라", 2), "가나... (truncated)");
    }

    #[tokio::test]
    async fn unconfigured_endpoint_fails_before_any_request() {
        let gateway = GeminiGateway::new(&Config::default(), Client::new());
        let err = gateway
            .generate_text(TextRequest {
                prompt: "hello".to_string(),
                image: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured(_)));
    }

    /// Serves `reply` for every path and returns the origin to point the gateway at.
    async fn fake_gemini(status: axum::http::StatusCode, reply: Value) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = axum::Router::new().fallback(move || {
            let reply = reply.clone();
            async move { (status, axum::Json(reply)) }
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{address}")
    }

    fn gateway_at(origin: String) -> GeminiGateway {
        let config = Config {
            model_endpoint: ModelEndpoint::GenerativeLanguage {
                api_key: "test-key".to_string(),
            },
            gemini_base_url: Some(origin),
            ..Config::default()
        };
        GeminiGateway::new(&config, Client::new())
    }

    fn text_request() -> TextRequest {
        TextRequest {
            prompt: "코디 추천".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn server_error_becomes_status_error() {
        let origin = fake_gemini(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": { "code": 500, "message": "backend unavailable" } }),
        )
        .await;
        let err = gateway_at(origin)
            .generate_text(text_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status { status: 500, ref detail } if detail == "backend unavailable"
        ));
    }

    #[tokio::test]
    async fn reply_without_text_is_an_empty_response() {
        let origin = fake_gemini(axum::http::StatusCode::OK, json!({ "candidates": [] })).await;
        let err = gateway_at(origin)
            .generate_text(text_request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse));
    }

    #[tokio::test]
    async fn text_only_image_reply_is_no_image() {
        let origin = fake_gemini(
            axum::http::StatusCode::OK,
            json!({ "candidates": [{ "content": { "parts": [{ "text": "sorry" }] } }] }),
        )
        .await;
        let err = gateway_at(origin)
            .generate_image(ImageRequest {
                prompt: "세 가지 코디".to_string(),
                reference: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoImage(ref model) if model == "gemini-2.5-flash-image"));
    }

    #[tokio::test]
    async fn successful_reply_returns_the_text() {
        let origin = fake_gemini(
            axum::http::StatusCode::OK,
            json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"score\": 80}" }] } }] }),
        )
        .await;
        let text = gateway_at(origin)
            .generate_text(text_request())
            .await
            .unwrap();
        assert_eq!(text, "{\"score\": 80}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway_at(format!("http://{address}"))
            .generate_text(text_request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
    }
}
