pub mod common;
pub mod image;

pub use self::common::*;
pub use self::image::*;
