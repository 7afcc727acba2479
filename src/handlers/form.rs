//! Request body decoding shared by the POST endpoints.
//!
//! Both endpoints accept either a JSON object or `multipart/form-data` whose text
//! fields carry JSON-encoded values and whose `image` field carries the photo.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::handlers::responses::ApiError;
use crate::pipeline::{validate_upload, AcceptedUpload};

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub struct RawUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct FormInput {
    pub fields: Map<String, Value>,
    pub upload: Option<RawUpload>,
    pub multipart: bool,
}

impl FormInput {
    /// Every name in `required` must be present and non-null.
    pub fn require(&self, required: &[&str]) -> Result<(), ApiError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| matches!(self.fields.get(*name), None | Some(Value::Null)))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::MissingFields(missing.join(", ")))
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|err| ApiError::Validation(err.to_string()))
    }

    /// Validates the uploaded photo, if a file part was sent at all.
    pub fn accept_upload(&mut self, max_size: usize) -> Result<Option<AcceptedUpload>, ApiError> {
        let Some(upload) = self.upload.take() else {
            return Ok(None);
        };
        let accepted = validate_upload(
            Some(upload.bytes),
            upload.content_type.as_deref(),
            upload.file_name,
            max_size,
        )?;
        Ok(Some(accepted))
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

pub async fn read_form<S>(request: Request, state: &S, max_file_size: usize) -> Result<FormInput, ApiError>
where
    S: Send + Sync,
{
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| ApiError::Validation(err.body_text()))?;
        read_multipart(multipart, max_file_size).await
    } else {
        let body = Bytes::from_request(request, state).await.map_err(|err| {
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::FileTooLarge {
                    limit: max_file_size,
                }
            } else {
                ApiError::Validation(err.body_text())
            }
        })?;
        read_json(&body)
    }
}

fn read_json(body: &[u8]) -> Result<FormInput, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FormInput::default());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(FormInput {
            fields,
            upload: None,
            multipart: false,
        }),
        Ok(_) => Err(ApiError::Validation(
            "request body must be a JSON object".to_string(),
        )),
        Err(err) => Err(ApiError::Validation(format!("request body is not valid JSON: {err}"))),
    }
}

async fn read_multipart(mut multipart: Multipart, max_file_size: usize) -> Result<FormInput, ApiError> {
    let mut input = FormInput {
        multipart: true,
        ..FormInput::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge {
                limit: max_file_size,
            }
        } else {
            ApiError::Validation(format!("failed to read multipart field: {}", err.body_text()))
        }
    })? {
        let name = field.name().unwrap_or("").to_string();
        if name == IMAGE_FIELD {
            let content_type = field.content_type().map(|value| value.to_string());
            let file_name = field.file_name().map(|value| value.to_string());
            let bytes = field.bytes().await.map_err(|err| {
                if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::FileTooLarge {
                        limit: max_file_size,
                    }
                } else {
                    ApiError::Validation(format!("failed to read image: {}", err.body_text()))
                }
            })?;
            input.upload = Some(RawUpload {
                bytes: bytes.to_vec(),
                content_type,
                file_name,
            });
            continue;
        }
        if name.is_empty() {
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|err| ApiError::Validation(format!("failed to read field {name}: {}", err.body_text())))?;
        input.fields.insert(name, decode_field(&text));
    }

    Ok(input)
}

/// Form fields are JSON-encoded; anything that is not valid JSON is kept as a string.
fn decode_field(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_fields_are_reported_together() {
        let input = read_json(br#"{"bodyInfo": {}, "tpo": null}"#).unwrap();
        let err = input.require(&["bodyInfo", "styleOptions", "tpo"]).unwrap_err();
        match err {
            ApiError::MissingFields(fields) => assert_eq!(fields, "styleOptions, tpo"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_body_has_no_fields() {
        let input = read_json(b"  ").unwrap();
        assert!(input.fields.is_empty());
        assert!(input.require(&["tpo"]).is_err());
    }

    #[test]
    fn non_object_json_is_a_validation_error() {
        assert!(matches!(read_json(b"[1]"), Err(ApiError::Validation(_))));
        assert!(matches!(read_json(b"{oops"), Err(ApiError::Validation(_))));
    }

    #[test]
    fn multipart_text_fields_decode_as_json() {
        assert_eq!(decode_field(r#"["캐주얼"]"#), json!(["캐주얼"]));
        assert_eq!(decode_field("true"), json!(true));
        assert_eq!(decode_field("카페"), json!("카페"));
        assert_eq!(decode_field(""), Value::Null);
    }
}
