//! Session state machine: upload, transform, display, download.

use crate::error::{Result, RetouchError};
use crate::transformer::ImageTransformer;
use crate::types::{data_url_bytes, data_url_payload, to_data_url, ImageFormat, Mode};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// User-facing message when a transform is requested without an upload.
pub const NO_IMAGE_MESSAGE: &str = "Please upload an image first.";

/// User-facing message for any transform failure. Underlying detail goes to
/// the log, not the user.
pub const TRANSFORM_FAILED_MESSAGE: &str = "Failed to process image. Please try again.";

/// An uploaded source image. Replaced wholesale on new upload or reset,
/// never partially mutated.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// File name as supplied by the caller.
    pub file_name: String,
    /// MIME type derived from the declared file extension.
    pub mime_type: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// The image as a base64 data-URL, ready for display.
    pub data_url: String,
}

/// A transformed image, present only after a successful transform.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// The result as a base64 data-URL, ready for display or download.
    pub data_url: String,
}

/// Owns all state for one image-editing session and orchestrates the
/// upload / transform / download transitions.
///
/// Every operation takes `&mut self`, so at most one transform can be in
/// flight at a time; a re-entrant `start_transform` is additionally rejected
/// by the busy guard.
pub struct Session<T> {
    transformer: T,
    original: Option<UploadedImage>,
    processed: Option<ProcessedImage>,
    busy: bool,
    last_error: Option<String>,
    active_mode: Option<Mode>,
}

impl<T: ImageTransformer> Session<T> {
    /// Creates an empty session driven by the given transformer.
    pub fn new(transformer: T) -> Self {
        Self {
            transformer,
            original: None,
            processed: None,
            busy: false,
            last_error: None,
            active_mode: None,
        }
    }

    /// The uploaded source image, if any.
    pub fn original(&self) -> Option<&UploadedImage> {
        self.original.as_ref()
    }

    /// The transformed image, if the last transform succeeded.
    pub fn processed(&self) -> Option<&ProcessedImage> {
        self.processed.as_ref()
    }

    /// True while a transform request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The user-facing message for the last failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The mode of the in-flight transform; `Some` iff [`is_busy`](Self::is_busy).
    pub fn active_mode(&self) -> Option<Mode> {
        self.active_mode
    }

    /// Clears all session state back to the initial empty state.
    pub fn reset(&mut self) {
        self.original = None;
        self.processed = None;
        self.busy = false;
        self.last_error = None;
        self.active_mode = None;
    }

    /// Loads a new source image, discarding any prior session state.
    ///
    /// The MIME type comes from the declared file extension only (unknown
    /// extensions fall back to PNG); the bytes are not inspected.
    pub fn upload(&mut self, file_name: impl Into<String>, data: Vec<u8>) {
        self.reset();
        let file_name = file_name.into();
        let mime_type = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .unwrap_or_default()
            .mime_type()
            .to_string();
        let data_url = to_data_url(&mime_type, &data);
        tracing::debug!(%file_name, %mime_type, size = data.len(), "image uploaded");
        self.original = Some(UploadedImage {
            file_name,
            mime_type,
            data,
            data_url,
        });
    }

    /// Reads a file from disk and uploads it.
    pub fn upload_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        self.upload(file_name, data);
        Ok(())
    }

    /// Runs one transform round trip and settles into the terminal state.
    ///
    /// State transitions (busy set, processed/error cleared) happen before
    /// the network call is issued; the terminal transition (processed set or
    /// error message set, busy cleared) happens after the call settles. All
    /// transformer failures collapse to [`TRANSFORM_FAILED_MESSAGE`]; the
    /// original image is never touched.
    pub async fn start_transform(&mut self, mode: Mode) {
        if self.busy {
            tracing::warn!(%mode, "transform already in flight, ignoring");
            return;
        }

        let (payload, mime_type) = match self.original.as_ref() {
            Some(original) => match data_url_payload(&original.data_url) {
                Ok(payload) => (payload.to_string(), original.mime_type.clone()),
                Err(e) => {
                    tracing::error!(%mode, error = %e, "uploaded image is not a valid data-URL");
                    self.last_error = Some(TRANSFORM_FAILED_MESSAGE.to_string());
                    return;
                }
            },
            None => {
                tracing::warn!(%mode, "transform requested with no uploaded image");
                self.last_error = Some(NO_IMAGE_MESSAGE.to_string());
                return;
            }
        };

        self.busy = true;
        self.active_mode = Some(mode);
        self.processed = None;
        self.last_error = None;

        match self.transformer.transform(&payload, &mime_type, mode).await {
            Ok(data) => {
                self.processed = Some(ProcessedImage {
                    data_url: format!("data:{};base64,{}", mime_type, data),
                });
            }
            Err(e) => {
                tracing::error!(%mode, error = %e, "image transform failed");
                self.last_error = Some(TRANSFORM_FAILED_MESSAGE.to_string());
            }
        }

        self.busy = false;
        self.active_mode = None;
    }

    /// Writes the processed image into `dir` and returns the full path.
    ///
    /// Valid only when a processed image exists; has no effect on session
    /// state. The file name is `processed_image_<unix-ms>.<ext>` where the
    /// extension comes from the original file name, falling back to `png`.
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let processed = self
            .processed
            .as_ref()
            .ok_or(RetouchError::NoProcessedImage)?;
        let bytes = data_url_bytes(&processed.data_url)?;

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = dir.as_ref().join(self.download_file_name_at(now_ms));
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), "processed image saved");
        Ok(path)
    }

    fn download_file_name_at(&self, timestamp_ms: u128) -> String {
        let extension = self
            .original
            .as_ref()
            .and_then(|o| Path::new(&o.file_name).extension())
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        format!("processed_image_{}.{}", timestamp_ms, extension)
    }
}
