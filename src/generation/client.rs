//! Generation client trait and request type.

use crate::error::{FlagPortraitError, Result};
use crate::image::ImageAsset;
use async_trait::async_trait;

/// Instruction sent alongside the two images.
pub const PORTRAIT_INSTRUCTION: &str = "Create a professional, high-quality profile portrait \
of the person in the first image, celebrating national pride with the flag shown in the second \
image. Keep the person's face, features and identity exactly as they are. Blend the flag's \
colors and pattern artistically into the background, clothing or lighting so it looks natural \
and dignified. Use a square composition suitable for a social media profile picture. Return \
only the final image.";

/// A validated pair of inputs for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The personal portrait.
    pub person: ImageAsset,
    /// The national flag.
    pub flag: ImageAsset,
}

impl GenerationRequest {
    /// Builds a request, requiring both assets to be present and non-empty.
    pub fn new(person: Option<&ImageAsset>, flag: Option<&ImageAsset>) -> Result<Self> {
        match (person, flag) {
            (Some(person), Some(flag)) if !person.is_empty() && !flag.is_empty() => Ok(Self {
                person: person.clone(),
                flag: flag.clone(),
            }),
            _ => Err(FlagPortraitError::MissingImages),
        }
    }
}

/// Trait for the external image-generation service.
///
/// One call to [`generate`](GenerationClient::generate) is exactly one
/// outbound request: no retries, no caching.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Composes the portrait from the person and flag images.
    async fn generate(&self, person: &ImageAsset, flag: &ImageAsset) -> Result<ImageAsset>;

    /// Returns the name of this client for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and the credential is accepted.
    async fn health_check(&self) -> Result<()>;
}
