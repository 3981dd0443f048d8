use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};

use crate::{
    error::{ImagenError, Result},
    models::InferencePayload,
};

/// Status and body of a response that made it back over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// The call produced no response at all.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &InferencePayload<'_>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImagenError::ClientError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl InferenceTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &InferencePayload<'_>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(RawResponse { status, body })
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    let mut message = err.to_string();

    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    let timed_out = err.is_timeout();
    if timed_out && !message.contains("timed out") {
        message = format!("request timed out: {}", message);
    }

    TransportError { message, timed_out }
}
