//! A scripted, deterministic engine.
//!
//! Used by the tests and by the CLI's `--offline` mode. Replies are generated
//! from the request unless a test overrides them; individual card images can
//! be made to fail, and text calls for a given question can be held back on a
//! semaphore until the test releases them.
//!
//! ```ignore
//! let mock = MockEngine::new();
//! mock.fail_interpretation(EngineError::CallFailed("boom".into()));
//! let provider = MockProvider::new(mock.clone());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::engine::{
    CardImage, Credential, EngineError, EngineProvider, EngineSession, InterpretRequest,
    InterpretationEngine, SummaryRequest,
};

/// A call the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `interpret` for a question.
    Interpret(String),
    /// `summarize` for a question.
    Summarize(String),
    /// `render_card_image` for a card name.
    Image(String),
}

#[derive(Debug, Default)]
struct MockState {
    interpretation: Option<Result<String, EngineError>>,
    summary: Option<Result<String, EngineError>>,
    image_failures: HashMap<String, EngineError>,
    blank_images: HashSet<String>,
    gates: HashMap<String, Arc<Semaphore>>,
    delay: Duration,
    calls: Vec<MockCall>,
    unlogged: bool,
}

/// Scripted engine. Clones share their script and call log.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// A mock that answers every call from the request.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reply to `interpret` with fixed text.
    pub fn with_interpretation(self, text: impl Into<String>) -> Self {
        self.state().interpretation = Some(Ok(text.into()));
        self
    }

    /// Reply to `summarize` with fixed text.
    pub fn with_summary(self, text: impl Into<String>) -> Self {
        self.state().summary = Some(Ok(text.into()));
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state().delay = delay;
        self
    }

    /// Stop recording calls. Long-running offline sessions use this so the
    /// call log does not grow with every reading.
    pub fn without_call_log(self) -> Self {
        {
            let mut state = self.state();
            state.unlogged = true;
            state.calls.clear();
        }
        self
    }

    /// Make `interpret` fail.
    pub fn fail_interpretation(&self, error: EngineError) {
        self.state().interpretation = Some(Err(error));
    }

    /// Make `summarize` fail.
    pub fn fail_summary(&self, error: EngineError) {
        self.state().summary = Some(Err(error));
    }

    /// Make the image for `card_name` fail.
    pub fn fail_image(&self, card_name: &str, error: EngineError) {
        self.state().image_failures.insert(card_name.to_string(), error);
    }

    /// Make the image for `card_name` come back empty.
    pub fn blank_image(&self, card_name: &str) {
        self.state().blank_images.insert(card_name.to_string());
    }

    /// Hold text calls for `question` until permits are added to the
    /// returned semaphore.
    pub fn gate(&self, question: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state()
            .gates
            .insert(question.to_string(), Arc::clone(&gate));
        gate
    }

    fn record(&self, call: MockCall) {
        let mut state = self.state();
        if !state.unlogged {
            state.calls.push(call);
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    async fn pause(&self, question: Option<&str>) -> Result<(), EngineError> {
        let (delay, gate) = {
            let state = self.state();
            let gate = question.and_then(|q| state.gates.get(q).cloned());
            (state.delay, gate)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.map_err(EngineError::call_failed)?;
        }
        Ok(())
    }
}

#[async_trait]
impl InterpretationEngine for MockEngine {
    async fn interpret(&self, request: InterpretRequest) -> Result<String, EngineError> {
        self.record(MockCall::Interpret(request.question.clone()));
        self.pause(Some(&request.question)).await?;
        if let Some(scripted) = self.state().interpretation.clone() {
            return scripted;
        }
        let mut text = format!(
            "A {} reading for \"{}\".\n",
            request.spread_name, request.question
        );
        for card in &request.cards {
            text.push_str(&format!("{}: {}.\n", card.position, card.name));
        }
        text.push_str("Trust what the cards have shown you.");
        Ok(text)
    }

    async fn summarize(&self, request: SummaryRequest) -> Result<String, EngineError> {
        self.record(MockCall::Summarize(request.question.clone()));
        self.pause(Some(&request.question)).await?;
        if let Some(scripted) = self.state().summary.clone() {
            return scripted;
        }
        let names: Vec<&str> = request.cards.iter().map(|c| c.name.as_str()).collect();
        Ok(format!("{} light the way.", names.join(", ")))
    }

    async fn render_card_image(&self, card_name: &str) -> Result<Option<CardImage>, EngineError> {
        self.record(MockCall::Image(card_name.to_string()));
        self.pause(None).await?;
        let state = self.state();
        if let Some(err) = state.image_failures.get(card_name) {
            return Err(err.clone());
        }
        if state.blank_images.contains(card_name) {
            return Ok(None);
        }
        Ok(Some(placeholder_image(card_name)))
    }
}

/// A small SVG tile naming the card.
fn placeholder_image(card_name: &str) -> CardImage {
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="200"><rect width="120" height="200" rx="8" fill="#4c1d95"/><text x="60" y="100" fill="#f3e8ff" font-size="11" text-anchor="middle">{}</text></svg>"##,
        card_name.replace('&', "&amp;").replace('<', "&lt;")
    );
    CardImage::from_bytes("image/svg+xml", svg.as_bytes())
}

/// Provider handing out sessions backed by a shared [`MockEngine`].
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    engine: MockEngine,
    configured: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Wrap `engine`.
    pub fn new(engine: MockEngine) -> Self {
        Self {
            engine,
            configured: Arc::new(Mutex::new(0)),
        }
    }

    /// The shared engine, for scripting and call inspection.
    pub fn engine(&self) -> &MockEngine {
        &self.engine
    }

    /// How many times a non-blank credential was configured.
    pub fn configure_count(&self) -> usize {
        *self.configured.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineProvider for MockProvider {
    fn configure(&self, credential: &Credential) -> EngineSession {
        if credential.is_blank() {
            tracing::warn!("blank credential, mock engine left unconfigured");
            return EngineSession::unconfigured();
        }
        *self.configured.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        EngineSession::new(Arc::new(self.engine.clone()))
    }
}
