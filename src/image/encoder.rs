//! Turns image files into [`ImageAsset`]s.

use crate::error::{FlagPortraitError, Result};
use crate::image::types::{ImageAsset, ImageFormat};
use std::path::{Path, PathBuf};

/// Stand-in path reported for input that did not come from a file.
const IN_MEMORY_PATH: &str = "<bytes>";

/// Reads an image file and encodes it.
///
/// No size or dimension checks are made. Any read failure, or an empty
/// file, is reported as [`FlagPortraitError::Encoding`].
pub async fn encode_file(path: impl AsRef<Path>) -> Result<ImageAsset> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), "failed to read image file: {e}");
        FlagPortraitError::Encoding {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let hint = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension);

    encode_bytes(&data, hint).map_err(|e| match e {
        FlagPortraitError::Encoding { reason, .. } => FlagPortraitError::Encoding {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Encodes raw image bytes.
///
/// The format comes from the magic bytes, then `hint`, then defaults to PNG.
pub fn encode_bytes(data: &[u8], hint: Option<ImageFormat>) -> Result<ImageAsset> {
    if data.is_empty() {
        return Err(FlagPortraitError::Encoding {
            path: PathBuf::from(IN_MEMORY_PATH),
            reason: "file is empty".into(),
        });
    }

    let format = ImageFormat::from_magic_bytes(data)
        .or(hint)
        .unwrap_or_default();
    tracing::debug!(
        format = format.mime_type(),
        size_bytes = data.len(),
        "encoded image"
    );
    Ok(ImageAsset::from_bytes_with_format(data, format))
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a data URL prefix, embedded whitespace and missing padding.
pub fn decode_base64_lenient(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;

    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(&cleaned)
        .map_err(|e| FlagPortraitError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    const PNG_BYTES: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, 0x49, 0x48, 0x44, 0x52,
    ];

    #[tokio::test]
    async fn test_encode_file_is_lossless() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&PNG_BYTES).unwrap();

        let asset = encode_file(file.path()).await.unwrap();
        assert_eq!(asset.format(), ImageFormat::Png);
        assert_eq!(asset.to_bytes().unwrap(), PNG_BYTES.to_vec());
    }

    #[tokio::test]
    async fn test_encode_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("person.png");

        let err = encode_file(&missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        match err {
            FlagPortraitError::Encoding { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_encode_empty_file() {
        let file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();

        let err = encode_file(file.path()).await.unwrap_err();
        match err {
            FlagPortraitError::Encoding { path, reason } => {
                assert_eq!(path, file.path());
                assert_eq!(reason, "file is empty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_encode_empty_bytes_names_in_memory_source() {
        let err = encode_bytes(&[], Some(ImageFormat::Png)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.to_string(), "failed to encode <bytes>: file is empty");
    }

    #[test]
    fn test_encode_bytes_uses_hint_for_unknown_magic() {
        let asset = encode_bytes(b"not really an image", Some(ImageFormat::WebP)).unwrap();
        assert_eq!(asset.format(), ImageFormat::WebP);

        let asset = encode_bytes(b"not really an image", None).unwrap();
        assert_eq!(asset.format(), ImageFormat::Png);

        // Magic bytes win over the extension
        let asset = encode_bytes(&PNG_BYTES, Some(ImageFormat::Jpeg)).unwrap();
        assert_eq!(asset.format(), ImageFormat::Png);
    }

    #[test]
    fn test_decode_lenient() {
        assert_eq!(decode_base64_lenient("aGk=").unwrap(), b"hi");
        assert_eq!(decode_base64_lenient("aGk").unwrap(), b"hi");
        assert_eq!(decode_base64_lenient("a G\nk=").unwrap(), b"hi");
        assert_eq!(
            decode_base64_lenient("data:image/png;base64,aGk=").unwrap(),
            b"hi"
        );
        assert!(decode_base64_lenient("!!!").is_err());
    }
}
