//! Error types for portrait generation.

use std::path::PathBuf;

/// Maximum length of upstream error text kept in an error value.
const MAX_ERROR_TEXT: usize = 300;

/// Errors that can occur while encoding inputs or generating a portrait.
#[derive(Debug, thiserror::Error)]
pub enum FlagPortraitError {
    /// A generation was requested before both images were uploaded.
    #[error("both the portrait and the flag image are required")]
    MissingImages,

    /// An input file could not be turned into an image asset.
    #[error("failed to encode {}: {reason}", .path.display())]
    Encoding {
        /// The file that failed, or `<bytes>` for in-memory input.
        path: PathBuf,
        /// Why encoding failed.
        reason: String,
    },

    /// API key missing, invalid, or lacking permission.
    #[error("authentication failed: {0}")]
    InvalidCredentials(String),

    /// The free-tier or billing quota has been used up.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error text from the response body.
        message: String,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The API answered, but not with an image.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving the download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlagPortraitError {
    /// Classifies this error into the category shown to the user.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingImages => ErrorKind::MissingImages,
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::Api { .. }
            | Self::ContentBlocked(_)
            | Self::UnexpectedResponse(_)
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Unknown,
        }
    }

    /// Returns the localized message for this error's kind.
    ///
    /// Never includes the underlying error text.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        self.kind().user_message(locale)
    }
}

/// User-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// One of the two images has not been uploaded yet.
    MissingImages,
    /// An input file could not be read or encoded.
    Encoding,
    /// The service rejected the credential or its permission scope.
    InvalidCredentials,
    /// The service reported an exhausted quota.
    QuotaExceeded,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Returns the message shown to the user for this category.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Self::MissingImages => "Please upload both images to continue.",
                Self::Encoding => "That file could not be read as an image. Please choose another.",
                Self::InvalidCredentials => {
                    "The API key is invalid or lacks permission. Please check it and try again."
                }
                Self::QuotaExceeded => {
                    "The free request quota has been exceeded. Please try again later."
                }
                Self::Unknown => {
                    "An unexpected error occurred while creating the image. Please try again."
                }
            },
            Locale::Ar => match self {
                Self::MissingImages => "يرجى رفع الصورتين للمتابعة.",
                Self::Encoding => "تعذر قراءة الملف كصورة. يرجى اختيار ملف آخر.",
                Self::InvalidCredentials => "مفتاح API غير صالح. يرجى التحقق منه والمحاولة مرة أخرى.",
                Self::QuotaExceeded => {
                    "لقد تم تجاوز حصة الطلبات المجانية. يرجى المحاولة مرة أخرى لاحقًا."
                }
                Self::Unknown => "حدث خطأ غير متوقع أثناء إنشاء الصورة. يرجى المحاولة مرة أخرى.",
            },
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingImages => write!(f, "missing_images"),
            Self::Encoding => write!(f, "encoding"),
            Self::InvalidCredentials => write!(f, "invalid_credentials"),
            Self::QuotaExceeded => write!(f, "quota_exceeded"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Language used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Arabic.
    Ar,
}

/// Redacts credentials and truncates upstream error text.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            // Google API keys start with "AIza"
            if let Some(pos) = word.find("AIza") {
                format!("{}[REDACTED]", &word[..pos])
            } else if let Some(pos) = word.find("key=") {
                format!("{}key=[REDACTED]", &word[..pos])
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_TEXT {
        let truncated: String = joined.chars().take(MAX_ERROR_TEXT).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

/// Result type alias for portrait operations.
pub type Result<T> = std::result::Result<T, FlagPortraitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            FlagPortraitError::InvalidCredentials("bad key".into()).kind(),
            ErrorKind::InvalidCredentials
        );
        assert_eq!(
            FlagPortraitError::QuotaExceeded("free tier".into()).kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            FlagPortraitError::ContentBlocked("nsfw".into()).kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            FlagPortraitError::Api {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            FlagPortraitError::MissingImages.kind(),
            ErrorKind::MissingImages
        );
    }

    #[test]
    fn test_user_message_hides_upstream_text() {
        let err = FlagPortraitError::Api {
            status: 500,
            message: "internal trace id 1234".into(),
        };
        let msg = err.user_message(Locale::En);
        assert!(!msg.contains("1234"));
        assert_eq!(msg, ErrorKind::Unknown.user_message(Locale::En));
    }

    #[test]
    fn test_arabic_messages() {
        assert_eq!(
            ErrorKind::MissingImages.user_message(Locale::Ar),
            "يرجى رفع الصورتين للمتابعة."
        );
        assert_ne!(
            ErrorKind::QuotaExceeded.user_message(Locale::Ar),
            ErrorKind::QuotaExceeded.user_message(Locale::En)
        );
    }

    #[test]
    fn test_error_display() {
        let err = FlagPortraitError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = FlagPortraitError::ContentBlocked("Safety filter triggered".into());
        assert_eq!(err.to_string(), "content blocked: Safety filter triggered");
    }

    #[test]
    fn test_sanitize_redacts_keys() {
        let text = "API key not valid: AIzaSyD123secret. Please pass a valid API key.";
        let clean = sanitize_error_message(text);
        assert!(!clean.contains("AIzaSyD123secret"));
        assert!(clean.contains("[REDACTED]"));

        let clean = sanitize_error_message("GET /v1?key=abc123 failed");
        assert!(!clean.contains("abc123"));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(1000);
        let clean = sanitize_error_message(&long);
        assert_eq!(clean.chars().count(), MAX_ERROR_TEXT + 3);
        assert!(clean.ends_with("..."));
    }
}
