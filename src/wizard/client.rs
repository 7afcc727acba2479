use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::handlers::{COORDINATE_PATH, GENERATE_IMAGE_PATH};
use crate::models::{CoordinateRequest, CoordinateResult, ImageGenerationRequest};
use crate::pipeline::AcceptedUpload;
use crate::utils::language::Language;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server rejected the request ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Text for the form's error banner. Server messages are already localized.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            _ => match language {
                Language::Korean => "요청을 처리하지 못했어요. 잠시 후 다시 시도해주세요",
                Language::English => "The request could not be completed. Please try again",
                Language::Japanese => "リクエストを処理できませんでした。もう一度お試しください",
            }
            .to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedImage {
    image_url: String,
}

/// HTTP client for the two styling endpoints.
///
/// Holds no language of its own: each call sends the caller's current
/// preference as `Accept-Language`.
#[derive(Debug, Clone)]
pub struct CoordinateClient {
    http: Client,
    base_url: String,
}

impl CoordinateClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        CoordinateClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn post(&self, path: &str, language: Language) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header(ACCEPT_LANGUAGE, language.code())
    }

    /// Sends JSON, or multipart with the photo in the `image` field.
    fn with_body<T: Serialize>(
        &self,
        builder: RequestBuilder,
        body: &T,
        photo: Option<&AcceptedUpload>,
    ) -> Result<RequestBuilder, ClientError> {
        let Some(photo) = photo else {
            return Ok(builder.json(body));
        };

        let mut form = Form::new();
        if let Value::Object(fields) = serde_json::to_value(body)? {
            for (name, value) in fields {
                form = form.text(name, value.to_string());
            }
        }
        let file_name = photo
            .file_name
            .clone()
            .unwrap_or_else(|| "photo".to_string());
        let part = Part::bytes(photo.image.bytes.clone())
            .file_name(file_name)
            .mime_str(&photo.image.mime_type)?;
        Ok(builder.multipart(form.part("image", part)))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Styling API responded: status={} bytes={}", status, text.len());

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|err| {
            warn!("Styling API returned a non-envelope body: {}", err);
            ClientError::MalformedResponse(format!("status {status}: {err}"))
        })?;
        if envelope.success {
            return envelope
                .data
                .ok_or_else(|| ClientError::MalformedResponse("missing data".to_string()));
        }
        let error = envelope.error.unwrap_or(ErrorBody {
            code: String::new(),
            message: String::new(),
        });
        Err(ClientError::Api {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
        })
    }

    pub async fn analyze(
        &self,
        request: &CoordinateRequest,
        photo: Option<&AcceptedUpload>,
        language: Language,
    ) -> Result<CoordinateResult, ClientError> {
        let builder = self.with_body(self.post(COORDINATE_PATH, language), request, photo)?;
        self.send(builder).await
    }

    /// Returns the generated composite as a `data:` URL.
    pub async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
        photo: Option<&AcceptedUpload>,
        language: Language,
    ) -> Result<String, ClientError> {
        let builder = self.with_body(self.post(GENERATE_IMAGE_PATH, language), request, photo)?;
        let generated: GeneratedImage = self.send(builder).await?;
        Ok(generated.image_url)
    }
}
