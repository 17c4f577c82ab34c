//! The interpretation engine contract.
//!
//! An [`EngineProvider`] turns a [`Credential`] into an [`EngineSession`]. The
//! session is a plain value owned by the reading machine: it either wraps a
//! configured [`InterpretationEngine`] or reports [`EngineError::NotConfigured`]
//! for every call.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

use tarot_core::Locale;

/// Why an engine call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No valid credential has been configured.
    #[error("interpretation engine is not configured")]
    NotConfigured,

    /// Transport or provider failure, including timeouts.
    #[error("engine call failed: {0}")]
    CallFailed(String),
}

impl EngineError {
    /// Build a [`EngineError::CallFailed`] from any displayable cause.
    pub fn call_failed(cause: impl fmt::Display) -> Self {
        Self::CallFailed(cause.to_string())
    }
}

/// A session-scoped API credential. Never logged, never persisted.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw credential string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::new(raw.into()))
    }

    /// Whether the credential is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }

    /// The raw credential, for building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret().trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// A generated card illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardImage {
    /// MIME type such as `image/jpeg`.
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub base64: String,
}

impl CardImage {
    /// Build an image from base64 data as returned by most providers.
    pub fn from_base64(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: base64.into(),
        }
    }

    /// Build an image from raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, STANDARD.encode(bytes))
    }

    /// `data:` URI suitable for embedding.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Decode the raw bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.base64)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/svg+xml" => "svg",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// One drawn card as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPrompt {
    /// Canonical (English) card name.
    pub name: String,
    /// Localized position label.
    pub position: String,
}

/// Input to [`InterpretationEngine::interpret`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretRequest {
    /// The user's question.
    pub question: String,
    /// Drawn cards in position order.
    pub cards: Vec<CardPrompt>,
    /// Localized spread name.
    pub spread_name: String,
    /// Language to answer in.
    pub locale: Locale,
}

/// Input to [`InterpretationEngine::summarize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    /// The full interpretation to condense.
    pub interpretation: String,
    /// The user's question.
    pub question: String,
    /// Drawn cards in position order.
    pub cards: Vec<CardPrompt>,
    /// Language to answer in.
    pub locale: Locale,
}

/// A configured interpretation engine. Every call is independent and fallible.
#[async_trait]
pub trait InterpretationEngine: Send + Sync {
    /// Free-text interpretation of a spread.
    async fn interpret(&self, request: InterpretRequest) -> Result<String, EngineError>;

    /// One-line condensed summary of an interpretation.
    async fn summarize(&self, request: SummaryRequest) -> Result<String, EngineError>;

    /// Illustration for a card, by canonical name.
    ///
    /// `Ok(None)` means the provider produced nothing; only
    /// [`EngineError::NotConfigured`] should be treated as more than a
    /// missing image by callers.
    async fn render_card_image(&self, card_name: &str) -> Result<Option<CardImage>, EngineError>;
}

/// Builds engine sessions from credentials.
pub trait EngineProvider: Send + Sync {
    /// Configure an engine. A blank credential yields an unconfigured session
    /// (logged, not an error): callers only learn about it from later calls.
    fn configure(&self, credential: &Credential) -> EngineSession;
}

/// An owned handle on a configured engine, or on nothing.
#[derive(Clone, Default)]
pub struct EngineSession {
    engine: Option<Arc<dyn InterpretationEngine>>,
}

impl EngineSession {
    /// A session whose calls all fail with [`EngineError::NotConfigured`].
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Wrap a configured engine.
    pub fn new(engine: Arc<dyn InterpretationEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Whether an engine is attached.
    pub fn is_configured(&self) -> bool {
        self.engine.is_some()
    }

    fn engine(&self) -> Result<&Arc<dyn InterpretationEngine>, EngineError> {
        self.engine.as_ref().ok_or(EngineError::NotConfigured)
    }

    /// See [`InterpretationEngine::interpret`].
    pub async fn interpret(&self, request: InterpretRequest) -> Result<String, EngineError> {
        self.engine()?.interpret(request).await
    }

    /// See [`InterpretationEngine::summarize`].
    pub async fn summarize(&self, request: SummaryRequest) -> Result<String, EngineError> {
        self.engine()?.summarize(request).await
    }

    /// See [`InterpretationEngine::render_card_image`].
    pub async fn render_card_image(
        &self,
        card_name: &str,
    ) -> Result<Option<CardImage>, EngineError> {
        self.engine()?.render_card_image(card_name).await
    }
}

impl fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Run an engine call with an upper bound; an elapsed call is a failure.
pub async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::CallFailed(format!(
            "timed out after {}s",
            limit.as_secs_f32()
        ))),
    }
}

static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());

/// Remove `**bold**` markers, keeping the enclosed text.
pub fn strip_bold_markup(text: &str) -> String {
    match BOLD.as_ref() {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_markers_removed() {
        assert_eq!(
            strip_bold_markup("**The Tower** means **sudden** change"),
            "The Tower means sudden change"
        );
        assert_eq!(strip_bold_markup("no markup *here*"), "no markup *here*");
    }

    #[test]
    fn credential_blank_and_redacted() {
        assert!(Credential::new("   ").is_blank());
        let key = Credential::new(" abc123 ");
        assert!(!key.is_blank());
        assert_eq!(key.expose(), "abc123");
        assert!(!format!("{key:?}").contains("abc123"));
    }

    #[test]
    fn image_data_uri() {
        let img = CardImage::from_bytes("image/png", b"png!");
        assert_eq!(img.data_uri(), "data:image/png;base64,cG5nIQ==");
        assert_eq!(img.bytes().unwrap(), b"png!");
        assert_eq!(img.extension(), "png");
    }

    #[tokio::test]
    async fn unconfigured_session_reports_not_configured() {
        let session = EngineSession::unconfigured();
        assert!(!session.is_configured());
        let err = session.render_card_image("The Fool").await.unwrap_err();
        assert_eq!(err, EngineError::NotConfigured);
        let err = session
            .summarize(SummaryRequest {
                interpretation: "x".into(),
                question: "q".into(),
                cards: Vec::new(),
                locale: Locale::En,
            })
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::NotConfigured);
    }

    #[tokio::test]
    async fn deadline_maps_to_call_failed() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, EngineError>(())
        };
        let err = with_deadline(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, EngineError::CallFailed(msg) if msg.contains("timed out")));
    }
}
