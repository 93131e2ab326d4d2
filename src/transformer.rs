//! The transformer trait, the seam between session state and the API client.

use crate::error::Result;
use crate::types::Mode;
use async_trait::async_trait;

/// Trait for services that transform an image according to a [`Mode`].
///
/// [`Session`](crate::Session) is generic over this trait so tests can drive
/// the full upload/transform/download flow with a fake instead of the live
/// API client.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Transforms the given base64-encoded image and returns the result as
    /// base64, one network round trip per call.
    ///
    /// `mime_type` describes the input encoding as declared by the caller;
    /// it is forwarded verbatim, not validated against the bytes.
    async fn transform(&self, image_base64: &str, mime_type: &str, mode: Mode) -> Result<String>;
}
