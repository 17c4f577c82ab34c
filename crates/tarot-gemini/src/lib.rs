//! Gemini adapter for the tarot reader.
//!
//! Text comes from the `generateContent` endpoint of a Gemini model; card
//! illustrations come from the `predict` endpoint of an Imagen model. Both are
//! plain JSON over HTTPS with the key in the `x-goog-api-key` header.

pub mod config;
pub mod engine;
pub mod prompts;
pub mod wire;

pub use config::GeminiConfig;
pub use engine::{GeminiEngine, GeminiProvider};
