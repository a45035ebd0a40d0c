//! The external image-generation boundary.

mod client;
mod gemini;

pub use client::{GenerationClient, GenerationRequest, PORTRAIT_INSTRUCTION};
pub use gemini::{GeminiClient, GeminiClientBuilder, GeminiModel, API_KEY_ENV_VARS};
