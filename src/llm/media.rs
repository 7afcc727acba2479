use base64::{engine::general_purpose, Engine as _};

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_mime_type(mime_type: &str) -> String {
    let lowered = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

/// Image bytes carried inline with a model request or returned by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl InlineImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_signature() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0, 0];
        assert_eq!(detect_mime_type(&png).as_deref(), Some("image/png"));
        assert_eq!(detect_mime_type(b"plain text, not an image"), None);
    }

    #[test]
    fn normalizes_legacy_aliases() {
        assert_eq!(normalize_mime_type("IMAGE/JPG"), "image/jpeg");
        assert_eq!(normalize_mime_type("image/png; charset=binary"), "image/png");
    }

    #[test]
    fn data_url_embeds_base64() {
        let image = InlineImage::new(vec![1, 2, 3], "image/png");
        assert_eq!(image.data_url(), "data:image/png;base64,AQID");
    }
}
