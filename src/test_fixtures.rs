use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;

use crate::config::{Credential, InferenceConfig};
use crate::inference::{InferenceTransport, RawResponse, TransportError};
use crate::models::InferencePayload;

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 128]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

pub fn config() -> InferenceConfig {
    InferenceConfig::new(Credential::new("hf_test_token").unwrap())
        .with_api_base("https://inference.test")
        .with_model("acme/painter")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub url: String,
    pub bearer: String,
    pub body: Value,
    pub timeout: Duration,
}

/// Transport that records every call and answers with a canned outcome.
pub struct FakeTransport {
    outcome: std::result::Result<RawResponse, TransportError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn responding(status: u16, body: impl Into<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(RawResponse {
                status,
                body: body.into(),
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str, timed_out: bool) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(TransportError {
                message: message.to_string(),
                timed_out,
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceTransport for FakeTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &InferencePayload<'_>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            bearer: bearer.to_string(),
            body: serde_json::to_value(payload).unwrap(),
            timeout,
        });
        self.outcome.clone()
    }
}
