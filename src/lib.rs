#![warn(missing_docs)]
//! Retouch - background removal and quality enhancement via the Gemini API.
//!
//! The actual transformation is performed by a hosted image model; this crate
//! is the session state and API glue around a single request/response call.
//!
//! # Quick Start
//!
//! ```no_run
//! use retouch::{GeminiClient, Mode, Session};
//!
//! #[tokio::main]
//! async fn main() -> retouch::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let mut session = Session::new(client);
//!
//!     session.upload_path("photo.png")?;
//!     session.start_transform(Mode::RemoveBackground).await;
//!
//!     if let Some(message) = session.last_error() {
//!         eprintln!("{message}");
//!     } else {
//!         session.download(".")?;
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod gemini;
mod session;
mod transformer;
mod types;

pub use error::{Result, RetouchError};
pub use gemini::{GeminiClient, GeminiClientBuilder, GEMINI_IMAGE_MODEL};
pub use session::{
    ProcessedImage, Session, UploadedImage, NO_IMAGE_MESSAGE, TRANSFORM_FAILED_MESSAGE,
};
pub use transformer::ImageTransformer;
pub use types::{to_data_url, ImageFormat, Mode};
