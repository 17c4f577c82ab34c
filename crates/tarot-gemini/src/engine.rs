//! The Gemini-backed interpretation engine.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use tarot_reading::engine::strip_bold_markup;
use tarot_reading::{
    CardImage, Credential, EngineError, EngineProvider, EngineSession, InterpretRequest,
    InterpretationEngine, SummaryRequest,
};

use crate::config::GeminiConfig;
use crate::prompts;
use crate::wire::{GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse};

/// Error bodies are cut to this many characters before being reported.
const MAX_ERROR_BODY: usize = 300;

/// Builds [`GeminiEngine`] sessions from a credential.
#[derive(Debug, Clone, Default)]
pub struct GeminiProvider {
    config: GeminiConfig,
}

impl GeminiProvider {
    /// A provider using `config`.
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }

    /// The configuration sessions are built with.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl EngineProvider for GeminiProvider {
    fn configure(&self, credential: &Credential) -> EngineSession {
        if credential.is_blank() {
            tracing::warn!("blank API key, Gemini engine left unconfigured");
            return EngineSession::unconfigured();
        }
        match GeminiEngine::new(self.config.clone(), credential.clone()) {
            Ok(engine) => {
                tracing::info!(model = %self.config.text_model, "Gemini engine configured");
                EngineSession::new(Arc::new(engine))
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not build HTTP client");
                EngineSession::unconfigured()
            }
        }
    }
}

/// Interpretation engine over the Gemini REST API.
#[derive(Debug)]
pub struct GeminiEngine {
    config: GeminiConfig,
    credential: Credential,
    client: Client,
}

impl GeminiEngine {
    /// Build an engine. Fails only if the HTTP client cannot be created.
    pub fn new(config: GeminiConfig, credential: Credential) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(config, credential, client))
    }

    /// Build an engine around an existing HTTP client.
    pub fn with_client(config: GeminiConfig, credential: Credential, client: Client) -> Self {
        Self {
            config,
            credential,
            client,
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, EngineError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.credential.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::CallFailed(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    EngineError::CallFailed(format!("connection failed: {e}"))
                } else {
                    EngineError::call_failed(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(EngineError::CallFailed(format!("HTTP {status}: {body}")));
        }

        response.json::<R>().await.map_err(EngineError::call_failed)
    }

    async fn generate_text(&self, prompt: String) -> Result<String, EngineError> {
        let response: GenerateContentResponse = self
            .post(&self.config.generate_url(), &GenerateContentRequest::prompt(prompt))
            .await?;
        Ok(strip_bold_markup(&response.text().unwrap_or_default()))
    }

    async fn generate_image(&self, card_name: &str) -> Result<Option<CardImage>, EngineError> {
        let response: PredictResponse = self
            .post(
                &self.config.predict_url(),
                &PredictRequest::single_image(prompts::card_image(card_name)),
            )
            .await?;
        Ok(response.predictions.into_iter().find_map(|p| {
            let data = p.bytes_base64_encoded?;
            let mime = p.mime_type.unwrap_or_else(|| "image/jpeg".to_string());
            Some(CardImage::from_base64(mime, data))
        }))
    }
}

#[async_trait]
impl InterpretationEngine for GeminiEngine {
    async fn interpret(&self, request: InterpretRequest) -> Result<String, EngineError> {
        let text = self.generate_text(prompts::interpretation(&request)).await;
        if let Err(err) = &text {
            tracing::error!(error = %err, "interpretation request failed");
        }
        text
    }

    async fn summarize(&self, request: SummaryRequest) -> Result<String, EngineError> {
        let text = self.generate_text(prompts::summary(&request)).await?;
        Ok(text.trim().to_string())
    }

    /// Failures other than a missing configuration come back as `Ok(None)`
    /// so one bad image never blocks the others.
    async fn render_card_image(&self, card_name: &str) -> Result<Option<CardImage>, EngineError> {
        match self.generate_image(card_name).await {
            Ok(Some(image)) => Ok(Some(image)),
            Ok(None) => {
                tracing::warn!(card = card_name, "no image generated");
                Ok(None)
            }
            Err(EngineError::NotConfigured) => Err(EngineError::NotConfigured),
            Err(err) => {
                tracing::warn!(card = card_name, error = %err, "image generation failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use tarot_core::Locale;
    use tarot_reading::CardPrompt;

    use super::*;

    /// Serve one HTTP response on a local port and hand back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (base, handle)
    }

    fn engine(base: &str) -> GeminiEngine {
        let config = GeminiConfig::default().with_base_url(base);
        let client = Client::builder().no_proxy().build().unwrap();
        GeminiEngine::with_client(config, Credential::new("secret-key"), client)
    }

    fn request() -> InterpretRequest {
        InterpretRequest {
            question: "Will it rain?".into(),
            cards: vec![CardPrompt {
                name: "The Sun".into(),
                position: "Guidance".into(),
            }],
            spread_name: "Single Card".into(),
            locale: Locale::En,
        }
    }

    #[test]
    fn blank_credential_leaves_session_unconfigured() {
        let provider = GeminiProvider::default();
        assert!(!provider.configure(&Credential::new(" ")).is_configured());
        assert!(provider.configure(&Credential::new("key")).is_configured());
    }

    #[tokio::test]
    async fn interpret_strips_bold_and_sends_key() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"**The Sun** says yes."}]}}]}"#,
        )
        .await;
        let text = engine(&base).interpret(request()).await.unwrap();
        assert_eq!(text, "The Sun says yes.");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /models/gemini-2.5-flash:generateContent"));
        assert!(raw.to_ascii_lowercase().contains("x-goog-api-key: secret-key"));
        assert!(raw.contains("Will it rain?"));
    }

    #[tokio::test]
    async fn http_error_is_call_failed() {
        let (base, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let err = engine(&base).interpret(request()).await.unwrap_err();
        assert!(matches!(err, EngineError::CallFailed(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn summary_is_trimmed() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"  Let the light in.\n"}]}}]}"#,
        )
        .await;
        let summary = engine(&base)
            .summarize(SummaryRequest {
                interpretation: "long text".into(),
                question: "q".into(),
                cards: Vec::new(),
                locale: Locale::En,
            })
            .await
            .unwrap();
        assert_eq!(summary, "Let the light in.");
    }

    #[tokio::test]
    async fn image_decoded_from_prediction() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"predictions":[{"bytesBase64Encoded":"aGVsbG8=","mimeType":"image/jpeg"}]}"#,
        )
        .await;
        let image = engine(&base).render_card_image("The Sun").await.unwrap().unwrap();
        assert_eq!(image.data_uri(), "data:image/jpeg;base64,aGVsbG8=");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /models/imagen-3.0-generate-002:predict"));
    }

    #[tokio::test]
    async fn image_failure_is_empty_not_error() {
        let (base, _server) = serve_once("403 Forbidden", "{}").await;
        assert_eq!(engine(&base).render_card_image("The Sun").await.unwrap(), None);

        let (base, _server) = serve_once("200 OK", r#"{"predictions":[]}"#).await;
        assert_eq!(engine(&base).render_card_image("The Sun").await.unwrap(), None);
    }
}
