//! Image assets and the encoder that produces them.

pub mod encoder;
mod types;

pub use encoder::{decode_base64_lenient, encode_bytes, encode_file};
pub use types::{ImageAsset, ImageFormat};
