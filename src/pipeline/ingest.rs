use thiserror::Error;

use crate::llm::media::{detect_mime_type, normalize_mime_type, InlineImage};

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("no image file was uploaded")]
    MissingFile,
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },
    #[error("unsupported file type {0}")]
    InvalidFileType(String),
}

/// A photo that passed validation, ready to be previewed or compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub image: InlineImage,
    pub file_name: Option<String>,
}

impl AcceptedUpload {
    /// `data:` URL the photo step shows as its preview.
    pub fn preview_data_url(&self) -> String {
        self.image.data_url()
    }
}

/// Checks presence, size and type of an uploaded photo.
///
/// The declared type must be an allowed image type and the bytes themselves
/// must sniff as the same kind of image.
pub fn validate_upload(
    bytes: Option<Vec<u8>>,
    declared_mime: Option<&str>,
    file_name: Option<String>,
    max_size: usize,
) -> Result<AcceptedUpload, IngestError> {
    let bytes = bytes.filter(|bytes| !bytes.is_empty()).ok_or(IngestError::MissingFile)?;
    if bytes.len() > max_size {
        return Err(IngestError::FileTooLarge {
            size: bytes.len(),
            limit: max_size,
        });
    }

    let detected = detect_mime_type(&bytes).map(|mime| normalize_mime_type(&mime));
    let declared = declared_mime
        .map(normalize_mime_type)
        .filter(|mime| !mime.is_empty() && mime != "application/octet-stream");

    let mime_type = match (declared, detected) {
        (Some(declared), Some(detected)) if declared == detected => declared,
        (Some(declared), Some(detected)) => {
            return Err(IngestError::InvalidFileType(format!(
                "{declared} (content is {detected})"
            )))
        }
        (Some(declared), None) => return Err(IngestError::InvalidFileType(declared)),
        (None, Some(detected)) => detected,
        (None, None) => return Err(IngestError::InvalidFileType("unknown".to_string())),
    };

    if !ALLOWED_IMAGE_TYPES.contains(&mime_type.as_str()) {
        return Err(IngestError::InvalidFileType(mime_type));
    }

    Ok(AcceptedUpload {
        image: InlineImage::new(bytes, mime_type),
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 16] = [
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];

    #[test]
    fn missing_or_empty_file_is_rejected() {
        assert_eq!(
            validate_upload(None, Some("image/png"), None, 100),
            Err(IngestError::MissingFile)
        );
        assert_eq!(
            validate_upload(Some(Vec::new()), Some("image/png"), None, 100),
            Err(IngestError::MissingFile)
        );
    }

    #[test]
    fn oversized_file_is_rejected_before_type_checks() {
        let err = validate_upload(Some(vec![0; 101]), Some("text/plain"), None, 100).unwrap_err();
        assert_eq!(err, IngestError::FileTooLarge { size: 101, limit: 100 });
    }

    #[test]
    fn declared_type_must_be_allowed_and_match_content() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00".to_vec();
        assert!(matches!(
            validate_upload(Some(gif), Some("image/gif"), None, 1_000),
            Err(IngestError::InvalidFileType(_))
        ));

        let text = b"definitely not a picture".to_vec();
        assert!(matches!(
            validate_upload(Some(text), Some("image/png"), None, 1_000),
            Err(IngestError::InvalidFileType(_))
        ));

        assert!(matches!(
            validate_upload(Some(PNG_HEADER.to_vec()), Some("image/jpeg"), None, 1_000),
            Err(IngestError::InvalidFileType(_))
        ));
    }

    #[test]
    fn accepted_upload_exposes_a_preview() {
        let upload = validate_upload(
            Some(PNG_HEADER.to_vec()),
            Some("image/png"),
            Some("me.png".to_string()),
            1_000,
        )
        .unwrap();
        assert_eq!(upload.image.mime_type, "image/png");
        assert!(upload.preview_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn missing_declared_type_uses_sniffed_type() {
        let upload =
            validate_upload(Some(PNG_HEADER.to_vec()), Some("application/octet-stream"), None, 1_000)
                .unwrap();
        assert_eq!(upload.image.mime_type, "image/png");
    }
}
