use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::ImageReader;

use crate::{
    config::InferenceConfig,
    error::Result,
    inference::transport::{InferenceTransport, ReqwestTransport},
    logger,
    models::{GenerationFailure, GenerationRequest, GenerationResult, ModelInfo},
};

/// Sends a prompt to a text-to-image model and hands back the image bytes.
///
/// One POST per call, no retries. Every failure comes back as
/// [`GenerationResult::Failure`]; `generate` itself cannot fail. The client
/// holds no mutable state, so clones can be used from several tasks at once.
#[derive(Clone)]
pub struct ImageRequestClient {
    config: InferenceConfig,
    transport: Arc<dyn InferenceTransport>,
}

impl ImageRequestClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: InferenceConfig, transport: Arc<dyn InferenceTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        self.config.endpoint_url()
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new(
                "stabilityai/stable-diffusion-2-1",
                "Stable Diffusion 2.1",
                "Stability AI",
                "768x768 latent diffusion, the default model",
            ),
            ModelInfo::new(
                "runwayml/stable-diffusion-v1-5",
                "Stable Diffusion 1.5",
                "RunwayML",
                "512x512 latent diffusion",
            ),
            ModelInfo::new(
                "CompVis/stable-diffusion-v1-4",
                "Stable Diffusion 1.4",
                "CompVis",
                "512x512 latent diffusion",
            ),
            ModelInfo::new(
                "stabilityai/stable-diffusion-xl-base-1.0",
                "Stable Diffusion XL 1.0",
                "Stability AI",
                "1024x1024 base model",
            ),
        ]
    }

    pub async fn generate(&self, prompt: &str) -> GenerationResult {
        match GenerationRequest::new(prompt, &self.config.model_id) {
            Ok(request) => self.send(&request).await,
            Err(failure) => {
                log::warn!("Refusing to call the model with an empty prompt");
                failure.into()
            }
        }
    }

    pub async fn send(&self, request: &GenerationRequest) -> GenerationResult {
        let url = self.config.endpoint_url();
        log::info!(
            "Generating image with model: {} [req:{}]",
            request.model_id,
            request.id
        );
        log::debug!("Prompt length: {} characters", request.prompt.chars().count());

        let _timer = logger::timer(&format!("generation {}", request.id));

        let response = match self
            .transport
            .post_json(
                &url,
                self.config.credential.expose(),
                &request.payload(),
                self.config.timeout,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.timed_out {
                    log::error!(
                        "Model call timed out after {}s [req:{}]",
                        self.config.timeout.as_secs(),
                        request.id
                    );
                } else {
                    log::error!("Network error when calling model [req:{}]: {}", request.id, e);
                }
                return GenerationFailure::transport(e.message).into();
            }
        };

        if response.status != 200 {
            let failure = GenerationFailure::rejection(response.status, &response.body);
            match failure.detail.error_message() {
                Some(message) => log::error!(
                    "Generation failed with status {} [req:{}]: {}",
                    response.status,
                    request.id,
                    message
                ),
                None => log::error!(
                    "Generation failed with status {} [req:{}]: {}",
                    response.status,
                    request.id,
                    failure.detail
                ),
            }
            return failure.into();
        }

        match sniff_image(&response.body) {
            Ok((width, height)) => {
                log::info!(
                    "Received {}x{} image, {} bytes [req:{}]",
                    width,
                    height,
                    response.body.len(),
                    request.id
                );
                GenerationResult::Success {
                    image_bytes: response.body,
                }
            }
            Err(description) => {
                log::error!(
                    "Status 200 but the body is not an image [req:{}]: {}",
                    request.id,
                    description
                );
                GenerationFailure::decode(response.status, description).into()
            }
        }
    }
}

/// Reads only the container header: format and pixel dimensions.
fn sniff_image(body: &Bytes) -> std::result::Result<(u32, u32), String> {
    let reader = ImageReader::new(Cursor::new(body.as_ref()))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;

    if reader.format().is_none() {
        return Err(format!(
            "response body ({} bytes) is not a recognised image format",
            body.len()
        ));
    }

    reader.into_dimensions().map_err(|e| e.to_string())
}
