pub mod gateway;
pub mod gemini;
pub mod media;

pub use gateway::{GatewayError, ImageRequest, ModelGateway, TextRequest};
pub use gemini::GeminiGateway;
pub use media::{detect_mime_type, InlineImage};
