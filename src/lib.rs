//! Text-to-image generation against the Hugging Face Inference API.
//!
//! ```no_run
//! # async fn run() -> hfimagen::Result<()> {
//! use hfimagen::{GenerationResult, ImageRequestClient, InferenceConfig};
//!
//! let client = ImageRequestClient::new(InferenceConfig::from_env()?)?;
//! match client.generate("A cozy tea shop at night, warm lights").await {
//!     GenerationResult::Success { image_bytes } => {
//!         let offer = hfimagen::render::DownloadOffer::from_image_bytes(&image_bytes)?;
//!         offer.save_to(std::path::Path::new("."))?;
//!     }
//!     GenerationResult::Failure(failure) => {
//!         eprintln!("{}", hfimagen::render::describe_failure(&failure));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod inference;
pub mod logger;
pub mod models;
pub mod render;

#[cfg(test)]
mod test_fixtures;

pub use config::{Credential, InferenceConfig};
pub use error::{ImagenError, Result};
pub use inference::{ImageRequestClient, InferenceTransport, ReqwestTransport};
pub use models::{
    FailureDetail, FailureKind, GenerationFailure, GenerationRequest, GenerationResult, ModelInfo,
};
