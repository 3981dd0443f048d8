//! Turning a generation result into something a person can look at: PNG
//! re-encoding, the download offer, and failure messages.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};

use crate::{
    error::Result,
    models::{FailureKind, GenerationFailure},
};

pub const DOWNLOAD_FILE_NAME: &str = "generated.png";
pub const DOWNLOAD_MIME: &str = "image/png";

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// A PNG ready to hand to the user under a fixed name.
#[derive(Debug, Clone)]
pub struct DownloadOffer {
    pub file_name: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DownloadOffer {
    /// Decodes whatever container the service returned and re-encodes it as PNG.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self> {
        let image = decode_image(bytes)?;
        let data = encode_png(&image)?;

        Ok(Self {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            mime: DOWNLOAD_MIME.to_string(),
            width: image.width(),
            height: image.height(),
            data,
        })
    }

    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.data)?;
        log::info!("💾 Image saved to: {}", path.display());
        Ok(path)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }

    /// Machine-readable summary: `path` when the PNG was written to disk,
    /// `data_uri` when it is handed over inline.
    pub fn to_json(&self, saved_to: Option<&Path>, with_data_uri: bool) -> Value {
        let mut report = json!({
            "ok": true,
            "file_name": self.file_name,
            "mime": self.mime,
            "width": self.width,
            "height": self.height,
        });
        if let Some(path) = saved_to {
            report["path"] = json!(path.display().to_string());
        }
        if with_data_uri {
            report["data_uri"] = json!(self.to_data_uri());
        }
        report
    }
}

pub fn describe_failure(failure: &GenerationFailure) -> String {
    match (failure.kind, failure.status_code) {
        (FailureKind::EmptyPromptRejected, _) => "Type a prompt first.".to_string(),
        (FailureKind::TransportFailure, _) => {
            format!("Network error when calling model: {}", failure.detail)
        }
        (FailureKind::DecodeFailure, Some(code)) => format!(
            "Generation failed (status {}). The response was not a readable image: {}",
            code, failure.detail
        ),
        (_, Some(code)) => format!(
            "Generation failed (status {}). Response: {}",
            code, failure.detail
        ),
        (_, None) => format!("Generation failed. Response: {}", failure.detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn test_png_round_trip_keeps_dimensions() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            let original = test_fixtures::encoded_image(7, 5, format);
            let first = decode_image(&original).unwrap();

            let offer = DownloadOffer::from_image_bytes(&original).unwrap();
            let second = decode_image(&offer.data).unwrap();

            assert_eq!((first.width(), first.height()), (7, 5));
            assert_eq!(
                (second.width(), second.height()),
                (first.width(), first.height())
            );
            assert_eq!((offer.width, offer.height), (7, 5));
            assert_eq!(image::guess_format(&offer.data).unwrap(), ImageFormat::Png);
        }
    }

    #[test]
    fn test_offer_uses_fixed_name_and_mime() {
        let offer = DownloadOffer::from_image_bytes(&test_fixtures::png_bytes(2, 2)).unwrap();
        assert_eq!(offer.file_name, "generated.png");
        assert_eq!(offer.mime, "image/png");
        assert!(offer.to_data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_save_to_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let offer = DownloadOffer::from_image_bytes(&test_fixtures::png_bytes(3, 2)).unwrap();

        let path = offer.save_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("generated.png"));
        assert_eq!(std::fs::read(&path).unwrap(), offer.data);
    }

    #[test]
    fn test_json_report_carries_data_uri() {
        let offer = DownloadOffer::from_image_bytes(&test_fixtures::png_bytes(3, 2)).unwrap();

        let inline = offer.to_json(None, true);
        assert_eq!(inline["ok"], true);
        assert_eq!(inline["mime"], "image/png");
        assert_eq!(inline["width"], 3);
        assert_eq!(inline["data_uri"], offer.to_data_uri().as_str());
        assert!(inline.get("path").is_none());

        let saved = offer.to_json(Some(Path::new("out/generated.png")), false);
        assert_eq!(saved["path"], "out/generated.png");
        assert!(saved.get("data_uri").is_none());
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        let err = DownloadOffer::from_image_bytes(b"definitely not pixels").unwrap_err();
        assert!(matches!(err, crate::error::ImagenError::ImageError(_)));
    }

    #[test]
    fn test_failure_messages() {
        let transport = GenerationFailure::transport("connection refused");
        assert_eq!(
            describe_failure(&transport),
            "Network error when calling model: connection refused"
        );

        let rejection = GenerationFailure::rejection(503, br#"{"error":"model loading"}"#);
        assert_eq!(
            describe_failure(&rejection),
            r#"Generation failed (status 503). Response: {"error":"model loading"}"#
        );

        assert_eq!(
            describe_failure(&GenerationFailure::empty_prompt()),
            "Type a prompt first."
        );

        let decode = GenerationFailure::decode(200, "bad header");
        assert!(describe_failure(&decode).starts_with("Generation failed (status 200)."));
    }
}
