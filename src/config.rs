use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{ImagenError, Result};

pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL_ID: &str = "stabilityai/stable-diffusion-2-1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const TOKEN_VAR: &str = "HF_TOKEN";
pub const MODEL_VAR: &str = "HF_MODEL_ID";
pub const API_BASE_VAR: &str = "HF_API_BASE";
pub const TIMEOUT_VAR: &str = "HF_TIMEOUT_SECS";

/// Bearer token for the inference endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ImagenError::ConfigurationMissing(format!(
                "{} is empty",
                TOKEN_VAR
            )));
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_base: String,
    pub model_id: String,
    pub credential: Credential,
    pub timeout: Duration,
}

impl InferenceConfig {
    pub fn new(credential: Credential) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            credential,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads configuration from the process environment. A missing
    /// `HF_TOKEN` is fatal: no client can be built without it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR).ok_or_else(|| {
            ImagenError::ConfigurationMissing(format!(
                "{} is not set; add it to the environment or a .env file",
                TOKEN_VAR
            ))
        })?;

        let mut config = Self::new(Credential::new(token)?);

        if let Some(model_id) = lookup(MODEL_VAR).filter(|v| !v.trim().is_empty()) {
            config = config.with_model(model_id.trim());
        }
        if let Some(api_base) = lookup(API_BASE_VAR).filter(|v| !v.trim().is_empty()) {
            config = config.with_api_base(api_base.trim());
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ImagenError::InvalidConfiguration(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    TIMEOUT_VAR, raw
                ))
            })?;
            if secs == 0 {
                return Err(ImagenError::InvalidConfiguration(format!(
                    "{} must be greater than zero",
                    TIMEOUT_VAR
                )));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<api_base>/models/<model_id>`
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.api_base.trim_end_matches('/'),
            self.model_id.trim_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = InferenceConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ImagenError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_blank_token_is_fatal() {
        let err = InferenceConfig::from_lookup(lookup_from(&[(TOKEN_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, ImagenError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::from_lookup(lookup_from(&[(TOKEN_VAR, "hf_abc")])).unwrap();
        assert_eq!(config.credential.expose(), "hf_abc");
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(
            config.endpoint_url(),
            "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1"
        );
    }

    #[test]
    fn test_overrides() {
        let config = InferenceConfig::from_lookup(lookup_from(&[
            (TOKEN_VAR, "hf_abc"),
            (MODEL_VAR, "runwayml/stable-diffusion-v1-5"),
            (API_BASE_VAR, "http://127.0.0.1:9000/"),
            (TIMEOUT_VAR, "30"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint_url(),
            "http://127.0.0.1:9000/models/runwayml/stable-diffusion-v1-5"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_timeout() {
        let err = InferenceConfig::from_lookup(lookup_from(&[
            (TOKEN_VAR, "hf_abc"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ImagenError::InvalidConfiguration(_)));

        let err = InferenceConfig::from_lookup(lookup_from(&[
            (TOKEN_VAR, "hf_abc"),
            (TIMEOUT_VAR, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ImagenError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_credential_is_redacted() {
        let config = InferenceConfig::new(Credential::new("hf_secret_value").unwrap());
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hf_secret_value"));
        assert!(printed.contains("Credential(***)"));
    }
}
