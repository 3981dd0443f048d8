use thiserror::Error;

/// Errors for the fallible paths around generation: startup configuration,
/// image re-encoding, saving files and logger setup.
///
/// Generation itself never returns this type; see
/// [`GenerationResult`](crate::models::GenerationResult).
#[derive(Debug, Error)]
pub enum ImagenError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Client error: {0}")]
    ClientError(String),
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Logger error: {0}")]
    LoggerError(String),
}

pub type Result<T> = std::result::Result<T, ImagenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = ImagenError::ConfigurationMissing("HF_TOKEN is not set".into());
        assert_eq!(err.to_string(), "Configuration missing: HF_TOKEN is not set");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: ImagenError = io.into();
        assert!(err.to_string().starts_with("IO error: "));
    }
}
