#![warn(missing_docs)]
//! Flag Portrait - compose a national pride portrait with Gemini.
//!
//! The user supplies a personal portrait and a national flag. Both are
//! encoded and sent to a Gemini image model together with a fixed
//! instruction, and the returned composite can be downloaded.
//!
//! # Quick Start
//!
//! ```no_run
//! use flag_portrait::{GeminiClient, Session, Slot};
//!
//! #[tokio::main]
//! async fn main() -> flag_portrait::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let mut session = Session::new();
//!     let _ = session.upload_file(Slot::Person, "me.jpg").await?;
//!     let _ = session.upload_file(Slot::Flag, "flag.png").await?;
//!     let _ = session.generate(&client).await?;
//!     if let Some(download) = session.download() {
//!         download.save_to(".")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`image`]: image assets and the file encoder
//! - [`generation`]: the generation client trait and the Gemini client
//! - [`session`]: the upload → generate → result state machine
//! - [`view`]: the screen a front end should render
//!
//! # Features
//!
//! - `cli` (default): the `flag-portrait` command-line front end

mod error;
pub mod generation;
pub mod image;
pub mod session;
pub mod view;

// Re-export error types at crate root
pub use error::{ErrorKind, FlagPortraitError, Locale, Result};

pub use generation::{
    GeminiClient, GeminiClientBuilder, GeminiModel, GenerationClient, GenerationRequest,
};
pub use image::{encode_bytes, encode_file, ImageAsset, ImageFormat};
pub use session::{
    Download, PendingGeneration, Session, SessionState, Slot, Ticket, Transition,
    DEFAULT_DOWNLOAD_NAME,
};
pub use view::View;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorKind, FlagPortraitError, Locale, Result};
    pub use crate::generation::{GeminiClient, GenerationClient};
    pub use crate::image::ImageAsset;
    pub use crate::session::{Session, SessionState, Slot};
    pub use crate::view::View;
}
