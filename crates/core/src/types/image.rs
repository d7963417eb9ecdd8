use serde::{Deserialize, Serialize};

/// Base64 payload of a local image, together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Local reference (path, `file://` URI or URL) the bytes were read from.
    pub source: String,
    /// Standard base64 of the image bytes.
    pub base64: String,
}

impl EncodedImage {
    pub fn new(source: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            base64: base64.into(),
        }
    }

    /// `data:` URL for embedding in a request. The endpoint is always told JPEG.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }

    /// Text after the last `/` of the source reference.
    pub fn file_name(&self) -> &str {
        file_name(&self.source)
    }
}

/// Text after the last `/` of a reference.
pub fn file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = EncodedImage::new("/tmp/fly.jpg", "AQID");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("file:///data/cache/ImagePicker/abc.jpg"), "abc.jpg");
        assert_eq!(file_name("plain.png"), "plain.png");
    }
}
