//! Image payloads exchanged with the generation service.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::errors::TryOnError;

pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";

/// A base64-encoded image together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Service responses are PNG unless stated otherwise.
    pub fn png(base64: impl Into<String>) -> Self {
        Self::new(base64, PNG)
    }

    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(STANDARD.encode(bytes), mime_type)
    }

    /// Split a `data:<mime>;base64,<payload>` URL into its parts.
    pub fn from_data_url(data_url: &str) -> Result<Self, TryOnError> {
        let invalid = || TryOnError::invalid_input("invalid data URL");

        let (header, data) = data_url.split_once(',').ok_or_else(invalid)?;
        if header.is_empty() || data.is_empty() {
            return Err(invalid());
        }
        let mime_type = header
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty())
            .ok_or_else(invalid)?;

        Ok(Self::new(data, mime_type))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    pub fn decode(&self) -> Result<Vec<u8>, TryOnError> {
        STANDARD
            .decode(self.base64.as_bytes())
            .map_err(|e| TryOnError::invalid_input(format!("image is not valid base64: {e}")))
    }
}

/// The user's photo: payload plus the handle a front end displays it with.
///
/// Immutable; a retake replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPhoto {
    #[serde(flatten)]
    pub image: EncodedImage,
    pub url: String,
}

impl UserPhoto {
    pub fn new(image: EncodedImage, url: impl Into<String>) -> Self {
        Self {
            image,
            url: url.into(),
        }
    }

    /// A camera frame arrives as a data URL, which doubles as its display handle.
    pub fn from_data_url(data_url: &str) -> Result<Self, TryOnError> {
        let image = EncodedImage::from_data_url(data_url)?;
        Ok(Self::new(image, data_url))
    }

    /// An uploaded file. The display handle is a data URL of the payload.
    pub fn from_upload(bytes: &[u8], mime_type: &str) -> Result<Self, TryOnError> {
        if bytes.is_empty() {
            return Err(TryOnError::invalid_input("uploaded image is empty"));
        }
        if !mime_type.starts_with("image/") {
            return Err(TryOnError::invalid_input(format!(
                "unsupported upload type '{mime_type}'"
            )));
        }
        let image = EncodedImage::from_bytes(bytes, mime_type);
        let url = image.to_data_url();
        Ok(Self::new(image, url))
    }
}
