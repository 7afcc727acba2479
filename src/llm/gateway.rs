use async_trait::async_trait;
use thiserror::Error;

use crate::llm::media::InlineImage;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model endpoint is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model returned no image (model: {0})")]
    NoImage(String),
}

/// A prompt, optionally accompanied by one inlined photo.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

/// The composite image call: a prompt plus the user's photo when one was supplied.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub reference: Option<InlineImage>,
}

/// The single integration point with the hosted generative model.
///
/// Each method issues exactly one request and waits for its completion.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate_text(&self, request: TextRequest) -> Result<String, GatewayError>;

    async fn generate_image(&self, request: ImageRequest) -> Result<InlineImage, GatewayError>;
}
