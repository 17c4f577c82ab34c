//! Endpoint and model configuration.

use std::time::Duration;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model for interpretations and summaries.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
/// Default model for card illustrations.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Configuration for [`crate::GeminiProvider`].
///
/// ```ignore
/// let config = GeminiConfig::default()
///     .with_text_model("gemini-2.5-pro")
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Model used for `generateContent`.
    pub text_model: String,
    /// Model used for `predict`.
    pub image_model: String,
    /// HTTP timeout per request.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(90),
        }
    }
}

impl GeminiConfig {
    /// Set the API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the text model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Set the image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the text generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.text_model)
    }

    /// URL of the image generation endpoint.
    pub fn predict_url(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.image_model)
    }
}
