use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::llm::gateway::GatewayError;
use crate::pipeline::{IngestError, PipelineError};
use crate::utils::language::Language;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required fields: {0}")]
    MissingFields(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no image file was uploaded")]
    MissingFile,
    #[error("upload exceeds {limit} bytes")]
    FileTooLarge { limit: usize },
    #[error("unsupported file type: {0}")]
    InvalidFileType(String),
    #[error("could not parse AI response: {0}")]
    AiParse(String),
    #[error("model endpoint is not configured: {0}")]
    AiConfig(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingFields(_) => "MISSING_FIELDS",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MissingFile => "MISSING_FILE",
            ApiError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ApiError::InvalidFileType(_) => "INVALID_FILE_TYPE",
            ApiError::AiParse(_) => "AI_PARSE_ERROR",
            ApiError::AiConfig(_) => "AI_CONFIG_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_)
            | ApiError::Validation(_)
            | ApiError::MissingFile
            | ApiError::FileTooLarge { .. }
            | ApiError::InvalidFileType(_) => StatusCode::BAD_REQUEST,
            ApiError::AiParse(_) | ApiError::AiConfig(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing text. Field names and validation details are appended untranslated.
    pub fn localized_message(&self, language: Language) -> String {
        use Language::{English, Japanese, Korean};

        match self {
            ApiError::MissingFields(fields) => {
                let base = match language {
                    Korean => "필수 입력 항목이 누락되었습니다",
                    English => "Required fields are missing",
                    Japanese => "必須項目が入力されていません",
                };
                format!("{base}: {fields}")
            }
            ApiError::Validation(detail) => {
                let base = match language {
                    Korean => "입력값이 올바르지 않습니다",
                    English => "Invalid input",
                    Japanese => "入力内容が正しくありません",
                };
                format!("{base}: {detail}")
            }
            ApiError::MissingFile => match language {
                Korean => "이미지 파일을 업로드해주세요",
                English => "Please upload an image file",
                Japanese => "画像ファイルをアップロードしてください",
            }
            .to_string(),
            ApiError::FileTooLarge { limit } => {
                let megabytes = (*limit as f64 / 1024.0 / 1024.0 * 10.0).round() / 10.0;
                match language {
                    Korean => format!("파일 크기는 {megabytes}MB 이하여야 합니다"),
                    English => format!("File must be {megabytes}MB or smaller"),
                    Japanese => format!("ファイルサイズは{megabytes}MB以下にしてください"),
                }
            }
            ApiError::InvalidFileType(_) => match language {
                Korean => "JPG, PNG, WEBP 형식의 이미지만 업로드할 수 있습니다",
                English => "Only JPG, PNG and WEBP images are supported",
                Japanese => "JPG・PNG・WEBP形式の画像のみアップロードできます",
            }
            .to_string(),
            ApiError::AiParse(_) => match language {
                Korean => "AI 응답을 처리하지 못했습니다. 다시 시도해주세요",
                English => "Could not read the AI response. Please try again",
                Japanese => "AIの応答を処理できませんでした。もう一度お試しください",
            }
            .to_string(),
            ApiError::AiConfig(_) => match language {
                Korean => "AI 서비스 설정이 올바르지 않습니다",
                English => "The AI service is not configured",
                Japanese => "AIサービスが正しく設定されていません",
            }
            .to_string(),
            ApiError::Internal(_) => match language {
                Korean => "서버 오류가 발생했습니다. 잠시 후 다시 시도해주세요",
                English => "Something went wrong. Please try again shortly",
                Japanese => "サーバーエラーが発生しました。しばらくしてから再度お試しください",
            }
            .to_string(),
        }
    }

    pub fn localized(self, language: Language) -> ApiFailure {
        ApiFailure {
            error: self,
            language,
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingFile => ApiError::MissingFile,
            IngestError::FileTooLarge { limit, .. } => ApiError::FileTooLarge { limit },
            IngestError::InvalidFileType(kind) => ApiError::InvalidFileType(kind),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Gateway(GatewayError::NotConfigured(reason)) => ApiError::AiConfig(reason),
            PipelineError::Gateway(other) => ApiError::Internal(other.to_string()),
            PipelineError::Parse(parse) => ApiError::AiParse(parse.to_string()),
        }
    }
}

/// An [`ApiError`] paired with the language its message is rendered in.
#[derive(Debug)]
pub struct ApiFailure {
    error: ApiError,
    language: Language,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            error!("Request failed: code={} error={}", self.error.code(), self.error);
        } else {
            warn!("Request rejected: code={} error={}", self.error.code(), self.error);
        }

        let body = json!({
            "success": false,
            "error": {
                "code": self.error.code(),
                "message": self.error.localized_message(self.language),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Response {
    Json(ApiSuccess {
        success: true,
        data,
    })
    .into_response()
}
