pub mod image_client;
pub mod transport;

pub use image_client::ImageRequestClient;
pub use transport::{InferenceTransport, RawResponse, ReqwestTransport, TransportError};
