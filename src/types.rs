//! Core types: transformation modes, image formats, and data-URL helpers.

use crate::error::{Result, RetouchError};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Which transformation to request from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Remove the background, leaving the main subject on transparency.
    RemoveBackground,
    /// Enhance sharpness, clarity, color balance, and lighting.
    Enhance,
}

impl Mode {
    /// Returns the instruction text sent to the model for this mode.
    ///
    /// The text is fixed per mode; no user-supplied content is ever
    /// interpolated into it.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::RemoveBackground => {
                "Remove the background of this image completely, leaving only \
                 the main subject. The new background must be transparent."
            }
            Self::Enhance => {
                "Enhance the quality of this image. Improve sharpness, clarity, \
                 color balance, and lighting. Optimize the final image for web \
                 usage to ensure a small file size without significant quality loss."
            }
        }
    }

    /// Returns the mode as a stable identifier (e.g. for logs and CLI output).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "remove-background",
            Self::Enhance => "enhance",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported image formats.
///
/// The format of an upload is derived from its declared file extension only;
/// no content inspection is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Encodes raw bytes as a `data:<mime>;base64,<payload>` URL.
pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// Returns the base64 payload of a data-URL, stripping the mime prefix.
pub(crate) fn data_url_payload(url: &str) -> Result<&str> {
    url.split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| RetouchError::InvalidImage("not a base64 data-URL".into()))
}

/// Decodes the base64 payload of a data-URL back to raw bytes.
pub(crate) fn data_url_bytes(url: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data_url_payload(url)?)
        .map_err(|e| RetouchError::InvalidImage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_instruction_is_fixed_per_mode() {
        assert!(Mode::RemoveBackground
            .instruction()
            .starts_with("Remove the background of this image completely"));
        assert!(Mode::RemoveBackground
            .instruction()
            .ends_with("The new background must be transparent."));
        assert!(Mode::Enhance
            .instruction()
            .starts_with("Enhance the quality of this image."));
        assert_ne!(Mode::RemoveBackground.instruction(), Mode::Enhance.instruction());
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::RemoveBackground.to_string(), "remove-background");
        assert_eq!(Mode::Enhance.to_string(), "enhance");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn data_url_round_trip() {
        let url = to_data_url("image/png", &[0, 1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(data_url_bytes(&url).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn data_url_payload_rejects_plain_strings() {
        assert!(data_url_payload("not a data url").is_err());
    }
}
