//! The reading session state machine.
//!
//! Steps run `AwaitingCredential → SelectingSpread → EnteringQuestion →
//! SelectingCards → GeneratingReading → ViewingReading`. Submitting draw
//! numbers launches the engine calls as Tokio tasks. Each task reports back a
//! [`ReadingEvent`] tagged with the generation of the reading that launched
//! it; [`ReadingMachine::apply`] is the only writer of session state and
//! drops events whose generation is no longer current.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use tarot_core::{Deck, Locale, Message, SpreadCatalog, SpreadDefinition, SpreadKind};

use crate::config::ReadingConfig;
use crate::engine::{
    CardImage, Credential, EngineError, EngineProvider, EngineSession, InterpretRequest,
    SummaryRequest, with_deadline,
};
use crate::error::{ReadingError, ReadingResult, ValidationError};
use crate::session::{DrawnCard, Narrative, ReadingSession};

/// Where the user is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Waiting for an API credential.
    AwaitingCredential,
    /// Choosing a spread.
    SelectingSpread,
    /// Typing the question.
    EnteringQuestion,
    /// Entering draw numbers.
    SelectingCards,
    /// Engine calls are in flight.
    GeneratingReading,
    /// The reading is on screen.
    ViewingReading,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingCredential => "awaiting a credential",
            Self::SelectingSpread => "selecting a spread",
            Self::EnteringQuestion => "entering the question",
            Self::SelectingCards => "selecting cards",
            Self::GeneratingReading => "generating the reading",
            Self::ViewingReading => "viewing the reading",
        })
    }
}

/// A global error shown on the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The engine is not configured; a new credential is needed.
    Credential,
    /// An engine call failed; the reading degraded but survived.
    CallFailed,
}

impl Fault {
    /// Banner text.
    pub fn message(self) -> Message {
        match self {
            Self::Credential => Message::EngineNotConfigured,
            Self::CallFailed => Message::EngineCallFailed,
        }
    }

    /// Where "try again" leads.
    pub fn retry_step(self) -> Step {
        match self {
            Self::Credential => Step::AwaitingCredential,
            Self::CallFailed => Step::SelectingSpread,
        }
    }
}

/// Which engine work is still outstanding for the live reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Card images have not all settled.
    pub images_pending: bool,
    /// Interpretation or summary is still running.
    pub text_pending: bool,
}

impl Progress {
    /// Whether anything is outstanding.
    pub fn is_busy(self) -> bool {
        self.images_pending || self.text_pending
    }
}

/// An engine call, as named in failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Image for the card at this index.
    Image(usize),
    /// The overall interpretation.
    Interpretation,
    /// The condensed summary.
    Summary,
}

/// What an engine task reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// An image arrived for the card at `index`.
    ImageReady {
        /// Card slot.
        index: usize,
        /// The image.
        image: CardImage,
    },
    /// Every image call has finished, successfully or not.
    ImagesSettled,
    /// The interpretation arrived.
    InterpretationReady {
        /// Engine output, markup already stripped.
        text: String,
    },
    /// The summary arrived.
    SummaryReady {
        /// Engine output.
        text: String,
    },
    /// A call failed.
    Failed {
        /// Which call.
        call: Call,
        /// Why.
        error: EngineError,
    },
}

/// An engine result tagged with the reading it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingEvent {
    /// Generation of the reading that launched the call.
    pub generation: u64,
    /// The result.
    pub kind: EventKind,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event belonged to the live reading and was folded in.
    Current,
    /// The event belonged to an abandoned reading and was dropped.
    Stale,
}

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<'a> {
    /// Credential form, with an inline error if a fault sent the user here.
    Credential {
        /// Inline error.
        error: Option<Message>,
    },
    /// Global error banner with a "try again" action.
    ErrorBanner {
        /// Banner text.
        message: Message,
        /// Destination of "try again".
        retry_to: Step,
    },
    /// Spread menu.
    SpreadSelection,
    /// Question prompt for the chosen spread.
    Question {
        /// Chosen spread.
        spread: SpreadKind,
    },
    /// Draw number entry.
    CardSelection {
        /// Numbers to enter.
        required: usize,
    },
    /// Loading indicator naming the outstanding work.
    Loading {
        /// Indicator text.
        message: Message,
    },
    /// The reading.
    Reading {
        /// The live session.
        session: &'a ReadingSession,
        /// Images are still generating.
        images_pending: bool,
    },
}

/// Owns the flow, the shuffled deck and the single live reading.
pub struct ReadingMachine {
    config: ReadingConfig,
    provider: Arc<dyn EngineProvider>,
    engine: EngineSession,
    catalog: SpreadCatalog,
    canonical: Deck,
    deck: Deck,
    rng: StdRng,
    locale: Locale,
    step: Step,
    spread: Option<SpreadKind>,
    question: Option<String>,
    session: Option<ReadingSession>,
    fault: Option<Fault>,
    progress: Progress,
    generation: u64,
    tx: UnboundedSender<ReadingEvent>,
    rx: UnboundedReceiver<ReadingEvent>,
}

impl fmt::Debug for ReadingMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadingMachine")
            .field("step", &self.step)
            .field("locale", &self.locale)
            .field("spread", &self.spread)
            .field("generation", &self.generation)
            .field("fault", &self.fault)
            .field("progress", &self.progress)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl ReadingMachine {
    /// A machine waiting for a credential, using the standard spreads.
    pub fn new(provider: Arc<dyn EngineProvider>, config: ReadingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let canonical = Deck::standard();
        Self {
            locale: config.locale,
            config,
            provider,
            engine: EngineSession::unconfigured(),
            catalog: SpreadCatalog::standard(),
            deck: canonical.clone(),
            canonical,
            rng,
            step: Step::AwaitingCredential,
            spread: None,
            question: None,
            session: None,
            fault: None,
            progress: Progress::default(),
            generation: 0,
            tx,
            rx,
        }
    }

    /// Replace the spread catalog.
    pub fn with_catalog(mut self, catalog: SpreadCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Current step.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Display locale.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Switch the display locale. Session state is untouched.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// The live reading, if any.
    pub fn session(&self) -> Option<&ReadingSession> {
        self.session.as_ref()
    }

    /// The global fault, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Outstanding engine work.
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Generation of the most recent reading.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The chosen spread.
    pub fn spread(&self) -> Option<SpreadKind> {
        self.spread
    }

    /// The recorded question.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// The shuffled deck for this reading.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// The spread catalog.
    pub fn catalog(&self) -> &SpreadCatalog {
        &self.catalog
    }

    /// Whether an engine is attached.
    pub fn is_configured(&self) -> bool {
        self.engine.is_configured()
    }

    /// Draw numbers the current spread requires.
    pub fn required_cards(&self) -> Option<usize> {
        self.definition().map(SpreadDefinition::card_count)
    }

    fn definition(&self) -> Option<&SpreadDefinition> {
        self.spread.and_then(|kind| self.catalog.get(kind))
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> ReadingResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ReadingError::InvalidTransition {
                action,
                step: self.step,
            })
        }
    }

    fn enter(&mut self, step: Step) {
        tracing::debug!(from = %self.step, to = %step, "transition");
        self.step = step;
    }

    /// Configure the engine from a credential and move on to the spread menu.
    pub fn submit_credential(&mut self, raw: &str) -> ReadingResult<()> {
        self.expect_step(Step::AwaitingCredential, "submit a credential")?;
        let credential = Credential::new(raw);
        if credential.is_blank() {
            return Err(ValidationError::EmptyCredential.into());
        }
        self.engine = self.provider.configure(&credential);
        tracing::info!(configured = self.engine.is_configured(), "engine configured");
        self.fault = None;
        self.enter(Step::SelectingSpread);
        Ok(())
    }

    /// Choose a spread. Reshuffles the deck and clears any earlier question
    /// or reading.
    pub fn select_spread(&mut self, kind: SpreadKind) -> ReadingResult<()> {
        self.expect_step(Step::SelectingSpread, "select a spread")?;
        if self.catalog.get(kind).is_none() {
            return Err(ReadingError::UnknownSpread(kind.to_string()));
        }
        self.deck = self.canonical.shuffled(&mut self.rng);
        self.spread = Some(kind);
        self.question = None;
        self.discard_session();
        self.enter(Step::EnteringQuestion);
        Ok(())
    }

    /// Record the question and move on to card selection.
    ///
    /// A spread that requires no cards sends the user back to the spread menu.
    pub fn submit_question(&mut self, text: &str) -> ReadingResult<()> {
        self.expect_step(Step::EnteringQuestion, "submit a question")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        self.question = Some(text.to_string());
        if self.required_cards().unwrap_or(0) == 0 {
            tracing::warn!(spread = ?self.spread, "spread requires no cards, back to spread menu");
            self.spread = None;
            self.enter(Step::SelectingSpread);
            return Ok(());
        }
        self.enter(Step::SelectingCards);
        Ok(())
    }

    /// Step back from card selection to the question, or from the question to
    /// the spread menu.
    pub fn go_back(&mut self) -> ReadingResult<()> {
        match self.step {
            Step::SelectingCards => self.enter(Step::EnteringQuestion),
            Step::EnteringQuestion => self.enter(Step::SelectingSpread),
            step => {
                return Err(ReadingError::InvalidTransition {
                    action: "go back",
                    step,
                });
            }
        }
        Ok(())
    }

    /// Validate draw numbers, build the reading and launch the engine calls.
    ///
    /// Every number is checked before any card is resolved, so a rejected
    /// submission leaves no trace. Outside a Tokio runtime the submission is
    /// refused with [`ReadingError::NoRuntime`].
    pub fn submit_numbers<S: AsRef<str>>(&mut self, inputs: &[S]) -> ReadingResult<()> {
        self.expect_step(Step::SelectingCards, "submit numbers")?;
        let (Some(definition), Some(question)) = (self.definition(), self.question.as_deref())
        else {
            return Err(ReadingError::UnknownSpread(
                self.spread.map(|k| k.to_string()).unwrap_or_default(),
            ));
        };

        let picks = tarot_core::draw(&self.deck, inputs, definition.card_count())
            .map_err(ValidationError::from)?;
        let runtime = Handle::try_current().map_err(|_| ReadingError::NoRuntime)?;
        let cards: Vec<DrawnCard> = picks
            .into_iter()
            .enumerate()
            .map(|(index, (number, card))| DrawnCard {
                card: *card,
                number,
                position: definition.position_label(index, self.locale),
                image: None,
            })
            .collect();
        let session = ReadingSession::new(
            self.generation + 1,
            question,
            definition.kind(),
            definition.name(self.locale),
            cards,
        );

        self.generation += 1;
        self.fault = None;
        self.progress = Progress {
            images_pending: true,
            text_pending: true,
        };
        self.launch_images(&runtime, &session);
        self.launch_interpretation(&runtime, &session);
        tracing::debug!(
            generation = self.generation,
            cards = session.cards().len(),
            "reading launched"
        );
        self.session = Some(session);
        self.enter(Step::GeneratingReading);
        Ok(())
    }

    /// Abandon the current reading, clear the fault and return to the spread
    /// menu, or to the credential form if the fault was a credential fault.
    pub fn start_new_reading(&mut self) -> ReadingResult<()> {
        let allowed = self.fault.is_some()
            || matches!(self.step, Step::GeneratingReading | Step::ViewingReading);
        if !allowed {
            return Err(ReadingError::InvalidTransition {
                action: "start a new reading",
                step: self.step,
            });
        }
        let target = match self.fault.take() {
            Some(Fault::Credential) => Step::AwaitingCredential,
            _ if !self.engine.is_configured() => Step::AwaitingCredential,
            _ => Step::SelectingSpread,
        };
        self.discard_session();
        self.spread = None;
        self.question = None;
        self.enter(target);
        Ok(())
    }

    fn discard_session(&mut self) {
        if self.session.take().is_some() || self.progress.is_busy() {
            // In-flight results for the old reading are now stale.
            self.generation += 1;
        }
        self.progress = Progress::default();
    }

    fn send(tx: &UnboundedSender<ReadingEvent>, generation: u64, kind: EventKind) {
        if tx.send(ReadingEvent { generation, kind }).is_err() {
            tracing::debug!(generation, "machine dropped, event discarded");
        }
    }

    fn launch_images(&self, runtime: &Handle, session: &ReadingSession) {
        let engine = self.engine.clone();
        let tx = self.tx.clone();
        let generation = session.generation();
        let limit = self.config.call_timeout;
        let names: Vec<&'static str> = session.cards().iter().map(|c| c.card.name).collect();

        runtime.spawn(async move {
            let calls = names.into_iter().enumerate().map(|(index, name)| {
                let engine = engine.clone();
                let tx = tx.clone();
                async move {
                    match with_deadline(limit, engine.render_card_image(name)).await {
                        Ok(Some(image)) => {
                            Self::send(&tx, generation, EventKind::ImageReady { index, image });
                        }
                        Ok(None) => tracing::debug!(card = name, "no image generated"),
                        Err(error) => Self::send(
                            &tx,
                            generation,
                            EventKind::Failed {
                                call: Call::Image(index),
                                error,
                            },
                        ),
                    }
                }
            });
            join_all(calls).await;
            Self::send(&tx, generation, EventKind::ImagesSettled);
        });
    }

    fn launch_interpretation(&self, runtime: &Handle, session: &ReadingSession) {
        let engine = self.engine.clone();
        let tx = self.tx.clone();
        let generation = session.generation();
        let limit = self.config.call_timeout;
        let request = InterpretRequest {
            question: session.question().to_string(),
            cards: session.prompts(),
            spread_name: session.spread_name().to_string(),
            locale: self.locale,
        };

        runtime.spawn(async move {
            let kind = match with_deadline(limit, engine.interpret(request)).await {
                Ok(text) => EventKind::InterpretationReady { text },
                Err(error) => EventKind::Failed {
                    call: Call::Interpretation,
                    error,
                },
            };
            Self::send(&tx, generation, kind);
        });
    }

    fn launch_summary(
        &self,
        runtime: &Handle,
        session: &ReadingSession,
        interpretation: String,
    ) {
        let engine = self.engine.clone();
        let tx = self.tx.clone();
        let generation = session.generation();
        let limit = self.config.call_timeout;
        let request = SummaryRequest {
            interpretation,
            question: session.question().to_string(),
            cards: session.prompts(),
            locale: self.locale,
        };

        runtime.spawn(async move {
            let kind = match with_deadline(limit, engine.summarize(request)).await {
                Ok(text) => EventKind::SummaryReady { text },
                Err(error) => EventKind::Failed {
                    call: Call::Summary,
                    error,
                },
            };
            Self::send(&tx, generation, kind);
        });
    }

    /// Fold one engine result into the live reading.
    ///
    /// Events from an earlier generation are dropped untouched.
    pub fn apply(&mut self, event: ReadingEvent) -> Applied {
        let current = self
            .session
            .as_ref()
            .is_some_and(|s| s.generation() == event.generation)
            && event.generation == self.generation;
        if !current {
            tracing::debug!(
                event = event.generation,
                live = self.generation,
                "dropping stale event"
            );
            return Applied::Stale;
        }

        match event.kind {
            EventKind::ImageReady { index, image } => {
                if let Some(card) = self
                    .session
                    .as_mut()
                    .and_then(|s| s.cards.get_mut(index))
                {
                    card.image = Some(image);
                }
            }
            EventKind::ImagesSettled => self.progress.images_pending = false,
            EventKind::InterpretationReady { text } => self.on_interpretation(text),
            EventKind::SummaryReady { text } => {
                if let Some(session) = self.session.as_mut() {
                    let text = text.trim();
                    session.summary = if Message::is_reserved(text) {
                        Narrative::Failed(Message::PartialInterpretationOracleFailed)
                    } else {
                        Narrative::Ready(text.to_string())
                    };
                }
                self.progress.text_pending = false;
            }
            EventKind::Failed { call, error } => self.on_failure(call, error),
        }

        self.finish_if_settled();
        Applied::Current
    }

    fn on_interpretation(&mut self, text: String) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if Message::is_reserved(&text) {
            tracing::warn!("interpretation is not usable, skipping summary");
            session.interpretation = if text.trim().is_empty() {
                Narrative::Failed(Message::InterpretationFailed)
            } else {
                Narrative::Ready(text)
            };
            session.summary = Narrative::Failed(Message::PartialInterpretationOracleFailed);
            self.progress.text_pending = false;
            return;
        }
        session.interpretation = Narrative::Ready(text.clone());
        let snapshot = session.clone();
        match Handle::try_current() {
            Ok(runtime) => self.launch_summary(&runtime, &snapshot, text),
            Err(_) => self.on_failure(
                Call::Summary,
                EngineError::CallFailed("no async runtime".into()),
            ),
        }
    }

    fn on_failure(&mut self, call: Call, error: EngineError) {
        match (call, error) {
            (call, EngineError::NotConfigured) => {
                tracing::warn!(?call, "engine not configured, discarding reading");
                self.discard_session();
                self.engine = EngineSession::unconfigured();
                self.spread = None;
                self.question = None;
                self.fault = Some(Fault::Credential);
                self.enter(Step::AwaitingCredential);
            }
            (Call::Image(index), EngineError::CallFailed(reason)) => {
                tracing::debug!(index, %reason, "card image failed");
            }
            (Call::Interpretation, EngineError::CallFailed(reason)) => {
                tracing::warn!(%reason, "interpretation failed");
                if let Some(session) = self.session.as_mut() {
                    session.interpretation = Narrative::Failed(Message::EngineCallFailed);
                    session.summary = Narrative::Failed(Message::OracleFailed);
                }
                self.fault = Some(Fault::CallFailed);
                self.progress.text_pending = false;
            }
            (Call::Summary, EngineError::CallFailed(reason)) => {
                tracing::warn!(%reason, "summary failed");
                if let Some(session) = self.session.as_mut() {
                    session.summary = Narrative::Failed(Message::PartialInterpretationOracleFailed);
                }
                self.progress.text_pending = false;
            }
        }
    }

    fn finish_if_settled(&mut self) {
        if self.step == Step::GeneratingReading && !self.progress.is_busy() {
            self.enter(Step::ViewingReading);
        }
    }

    /// Wait for the next engine result and apply it.
    ///
    /// Returns `None` only if the channel closed.
    pub async fn process_next(&mut self) -> Option<Applied> {
        let event = self.rx.recv().await?;
        Some(self.apply(event))
    }

    /// Apply every result that has already arrived without waiting.
    pub fn process_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply results until the live reading is no longer generating.
    pub async fn settle(&mut self) {
        while self.step == Step::GeneratingReading {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// What the presentation layer should render now.
    pub fn screen(&self) -> Screen<'_> {
        if let Some(fault) = self.fault {
            if self.step != Step::AwaitingCredential {
                return Screen::ErrorBanner {
                    message: fault.message(),
                    retry_to: fault.retry_step(),
                };
            }
        }
        match self.step {
            Step::AwaitingCredential => Screen::Credential {
                error: self.fault.map(Fault::message),
            },
            Step::SelectingSpread => Screen::SpreadSelection,
            Step::EnteringQuestion => match self.spread {
                Some(spread) => Screen::Question { spread },
                None => Screen::SpreadSelection,
            },
            Step::SelectingCards => match self.required_cards() {
                Some(required) if required > 0 => Screen::CardSelection { required },
                _ => Screen::SpreadSelection,
            },
            Step::GeneratingReading => Screen::Loading {
                message: if self.progress.text_pending {
                    Message::GeneratingReading
                } else if self.progress.images_pending {
                    Message::GeneratingImages
                } else {
                    Message::GeneratingReadingDefault
                },
            },
            Step::ViewingReading => match self.session.as_ref() {
                Some(session) => Screen::Reading {
                    session,
                    images_pending: self.progress.images_pending,
                },
                None => Screen::Loading {
                    message: Message::Loading,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MockCall, MockEngine, MockProvider};

    fn machine(mock: &MockEngine) -> ReadingMachine {
        let provider = Arc::new(MockProvider::new(mock.clone()));
        ReadingMachine::new(provider, ReadingConfig::default().with_seed(42))
    }

    fn ready_for_cards(mock: &MockEngine, spread: SpreadKind, question: &str) -> ReadingMachine {
        let mut m = machine(mock);
        m.submit_credential("test-key").unwrap();
        m.select_spread(spread).unwrap();
        m.submit_question(question).unwrap();
        m
    }

    fn card_name(m: &ReadingMachine, number: usize) -> &'static str {
        m.deck().resolve(number).unwrap().name
    }

    // -- credential and navigation --

    #[test]
    fn blank_credential_rejected() {
        let mut m = machine(&MockEngine::new());
        let err = m.submit_credential("   ").unwrap_err();
        assert_eq!(err, ReadingError::Validation(ValidationError::EmptyCredential));
        assert_eq!(m.step(), Step::AwaitingCredential);
        assert!(!m.is_configured());
    }

    #[test]
    fn credential_configures_engine() {
        let mut m = machine(&MockEngine::new());
        m.submit_credential(" key ").unwrap();
        assert!(m.is_configured());
        assert_eq!(m.step(), Step::SelectingSpread);
        assert_eq!(m.screen(), Screen::SpreadSelection);
    }

    #[test]
    fn question_is_trimmed_and_required() {
        let mut m = machine(&MockEngine::new());
        m.submit_credential("key").unwrap();
        m.select_spread(SpreadKind::ThreeCard).unwrap();
        assert_eq!(
            m.submit_question("  \n").unwrap_err(),
            ReadingError::Validation(ValidationError::EmptyQuestion)
        );
        assert_eq!(m.step(), Step::EnteringQuestion);
        m.submit_question("  What now?  ").unwrap();
        assert_eq!(m.question(), Some("What now?"));
        assert_eq!(m.screen(), Screen::CardSelection { required: 3 });
    }

    #[test]
    fn go_back_walks_the_flow() {
        let mut m = ready_for_cards(&MockEngine::new(), SpreadKind::Single, "q");
        m.go_back().unwrap();
        assert_eq!(m.step(), Step::EnteringQuestion);
        m.go_back().unwrap();
        assert_eq!(m.step(), Step::SelectingSpread);
        assert!(matches!(
            m.go_back(),
            Err(ReadingError::InvalidTransition { step: Step::SelectingSpread, .. })
        ));
    }

    #[test]
    fn out_of_order_actions_rejected() {
        let mut m = machine(&MockEngine::new());
        assert!(matches!(
            m.select_spread(SpreadKind::Single),
            Err(ReadingError::InvalidTransition { .. })
        ));
        assert!(matches!(
            m.start_new_reading(),
            Err(ReadingError::InvalidTransition { .. })
        ));
        assert_eq!(m.step(), Step::AwaitingCredential);
    }

    #[test]
    fn each_spread_requires_its_card_count() {
        for kind in SpreadKind::all() {
            let m = ready_for_cards(&MockEngine::new(), *kind, "q");
            let def = m.catalog().get(*kind).unwrap();
            assert_eq!(def.positions(Locale::En).len(), def.card_count());
            assert_eq!(m.step(), Step::SelectingCards);
            assert_eq!(m.required_cards(), Some(def.card_count()));
        }
    }

    #[test]
    fn select_spread_reshuffles() {
        let mut m = ready_for_cards(&MockEngine::new(), SpreadKind::Single, "q");
        let first = m.deck().clone();
        m.go_back().unwrap();
        m.go_back().unwrap();
        m.select_spread(SpreadKind::Single).unwrap();
        assert_ne!(m.deck(), &first);
        assert_eq!(m.question(), None);
    }

    #[test]
    fn zero_card_spread_redirects() {
        let mut catalog = SpreadCatalog::standard();
        catalog.insert(
            SpreadDefinition::new(
                SpreadKind::Single,
                0,
                tarot_core::Localized::new("Empty", "空"),
                tarot_core::Localized::new("", ""),
                Vec::new(),
            )
            .unwrap(),
        );
        let provider = Arc::new(MockProvider::new(MockEngine::new()));
        let mut m = ReadingMachine::new(provider, ReadingConfig::default()).with_catalog(catalog);
        m.submit_credential("key").unwrap();
        m.select_spread(SpreadKind::Single).unwrap();
        m.submit_question("q").unwrap();
        assert_eq!(m.step(), Step::SelectingSpread);
        assert_eq!(m.screen(), Screen::SpreadSelection);
    }

    // -- number validation --

    #[test]
    fn first_failing_rule_wins() {
        let mut m = ready_for_cards(&MockEngine::new(), SpreadKind::ThreeCard, "q");
        let err = m.submit_numbers(&["", "5", "5"]).unwrap_err();
        assert_eq!(
            err.message().render(Locale::En),
            "Please enter a number for card 1."
        );
        assert_eq!(m.step(), Step::SelectingCards);
    }

    #[test]
    fn duplicate_rejected_without_session() {
        let mut m = ready_for_cards(&MockEngine::new(), SpreadKind::ThreeCard, "q");
        let err = m.submit_numbers(&["12", "40", "12"]).unwrap_err();
        assert_eq!(
            err,
            ReadingError::Validation(ValidationError::Draw(
                tarot_core::DrawError::DuplicateNumber { number: 12 }
            ))
        );
        assert!(m.session().is_none());
        assert_eq!(m.generation(), 0);
    }

    // -- reconciliation --

    #[tokio::test]
    async fn successful_reading() {
        let mock = MockEngine::new()
            .with_interpretation("**The Tower** calls for courage.")
            .with_summary("  Walk through the open door.  ");
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "Should I move?");
        let expected: Vec<&str> = [12, 40, 3].iter().map(|n| card_name(&m, *n)).collect();
        m.submit_numbers(&["12", "40", "3"]).unwrap();
        assert_eq!(m.step(), Step::GeneratingReading);
        assert!(matches!(m.screen(), Screen::Loading { .. }));

        m.settle().await;
        assert_eq!(m.step(), Step::ViewingReading);
        assert_eq!(m.fault(), None);
        let session = m.session().unwrap();
        let names: Vec<&str> = session.cards().iter().map(|c| c.card.name).collect();
        assert_eq!(names, expected);
        assert_eq!(session.cards()[0].position, "過去");
        assert_eq!(session.cards()[2].number, 3);
        assert!(session.cards().iter().all(|c| c.image.is_some()));
        assert_eq!(
            session.interpretation().text(),
            Some("**The Tower** calls for courage.")
        );
        assert_eq!(session.summary().text(), Some("Walk through the open door."));
        assert!(matches!(m.screen(), Screen::Reading { images_pending: false, .. }));
    }

    #[tokio::test]
    async fn interpretation_not_configured_is_fatal() {
        let mock = MockEngine::new();
        mock.fail_interpretation(EngineError::NotConfigured);
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "q");
        m.submit_numbers(&["1", "2", "3"]).unwrap();
        m.settle().await;

        assert!(m.session().is_none());
        assert_eq!(m.step(), Step::AwaitingCredential);
        assert_eq!(m.fault(), Some(Fault::Credential));
        assert!(!m.is_configured());
        assert_eq!(m.progress(), Progress::default());
        assert_eq!(
            m.screen(),
            Screen::Credential {
                error: Some(Message::EngineNotConfigured)
            }
        );
    }

    #[tokio::test]
    async fn interpretation_call_failure_degrades() {
        let mock = MockEngine::new();
        mock.fail_interpretation(EngineError::CallFailed("503".into()));
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "q");
        m.submit_numbers(&["1", "2", "3"]).unwrap();
        m.settle().await;

        assert_eq!(m.step(), Step::ViewingReading);
        assert_eq!(m.fault(), Some(Fault::CallFailed));
        let session = m.session().unwrap();
        assert_eq!(session.cards().len(), 3);
        assert_eq!(
            session.interpretation(),
            &Narrative::Failed(Message::EngineCallFailed)
        );
        assert_eq!(session.summary(), &Narrative::Failed(Message::OracleFailed));
        assert!(!mock.calls().iter().any(|c| matches!(c, MockCall::Summarize(_))));
        assert_eq!(
            m.screen(),
            Screen::ErrorBanner {
                message: Message::EngineCallFailed,
                retry_to: Step::SelectingSpread
            }
        );
    }

    #[tokio::test]
    async fn image_failures_are_isolated() {
        let mock = MockEngine::new();
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "q");
        mock.fail_image(card_name(&m, 20), EngineError::CallFailed("blocked".into()));
        m.submit_numbers(&["10", "20", "30"]).unwrap();
        m.settle().await;

        let session = m.session().unwrap();
        assert!(session.cards()[0].image.is_some());
        assert!(session.cards()[1].image.is_none());
        assert!(session.cards()[2].image.is_some());
        assert_eq!(m.fault(), None);
        assert!(session.summary().text().is_some());
    }

    #[tokio::test]
    async fn empty_image_is_not_an_error() {
        let mock = MockEngine::new();
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        mock.blank_image(card_name(&m, 7));
        m.submit_numbers(&["7"]).unwrap();
        m.settle().await;
        assert!(m.session().unwrap().cards()[0].image.is_none());
        assert_eq!(m.fault(), None);
    }

    #[tokio::test]
    async fn image_not_configured_is_fatal() {
        let mock = MockEngine::new();
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        mock.fail_image(card_name(&m, 7), EngineError::NotConfigured);
        m.submit_numbers(&["7"]).unwrap();
        m.settle().await;
        assert!(m.session().is_none());
        assert_eq!(m.step(), Step::AwaitingCredential);
    }

    #[tokio::test]
    async fn summary_failure_marks_partial() {
        let mock = MockEngine::new();
        mock.fail_summary(EngineError::CallFailed("timeout".into()));
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        m.submit_numbers(&["7"]).unwrap();
        m.settle().await;
        let session = m.session().unwrap();
        assert_eq!(m.step(), Step::ViewingReading);
        assert!(session.interpretation().text().is_some());
        assert_eq!(
            session.summary(),
            &Narrative::Failed(Message::PartialInterpretationOracleFailed)
        );
        assert_eq!(m.fault(), None);
    }

    #[tokio::test]
    async fn summary_not_configured_is_fatal() {
        let mock = MockEngine::new();
        mock.fail_summary(EngineError::NotConfigured);
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        m.submit_numbers(&["7"]).unwrap();
        m.settle().await;
        assert_eq!(m.step(), Step::AwaitingCredential);
        assert!(m.session().is_none());
        assert_eq!(m.fault(), Some(Fault::Credential));
        assert!(!m.is_configured());
    }

    #[test]
    fn submit_without_runtime_is_refused() {
        let mock = MockEngine::new();
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        assert_eq!(m.submit_numbers(&["7"]).unwrap_err(), ReadingError::NoRuntime);
        assert_eq!(m.step(), Step::SelectingCards);
        assert!(m.session().is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn reserved_interpretation_skips_summary() {
        let mock =
            MockEngine::new().with_interpretation(Message::InterpretationFailed.render(Locale::En));
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        m.submit_numbers(&["7"]).unwrap();
        m.settle().await;
        assert_eq!(
            m.session().unwrap().summary(),
            &Narrative::Failed(Message::PartialInterpretationOracleFailed)
        );
        assert!(!mock.calls().iter().any(|c| matches!(c, MockCall::Summarize(_))));
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let mock = MockEngine::new().with_delay(Duration::from_millis(200));
        let provider = Arc::new(MockProvider::new(mock));
        let config = ReadingConfig::default()
            .with_seed(1)
            .with_call_timeout(Duration::from_millis(20));
        let mut m = ReadingMachine::new(provider, config);
        m.submit_credential("key").unwrap();
        m.select_spread(SpreadKind::Single).unwrap();
        m.submit_question("q").unwrap();
        m.submit_numbers(&["1"]).unwrap();
        m.settle().await;
        assert_eq!(m.step(), Step::ViewingReading);
        assert_eq!(m.fault(), Some(Fault::CallFailed));
        assert!(m.session().unwrap().cards()[0].image.is_none());
    }

    // -- stale-session guard --

    #[tokio::test]
    async fn stale_event_is_dropped() {
        let mock = MockEngine::new();
        let gate = mock.gate("B");
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "A");
        m.submit_numbers(&["1"]).unwrap();
        let reading_a = m.generation();

        m.start_new_reading().unwrap();
        assert_eq!(m.step(), Step::SelectingSpread);
        assert!(m.session().is_none());
        m.select_spread(SpreadKind::Single).unwrap();
        m.submit_question("B").unwrap();
        m.submit_numbers(&["2"]).unwrap();
        assert_ne!(m.generation(), reading_a);

        let applied = m.apply(ReadingEvent {
            generation: reading_a,
            kind: EventKind::InterpretationReady {
                text: "from A".into(),
            },
        });
        assert_eq!(applied, Applied::Stale);
        let session = m.session().unwrap();
        assert_eq!(session.question(), "B");
        assert!(session.interpretation().is_pending());
        gate.add_permits(8);
    }

    #[tokio::test]
    async fn abandoned_reading_cannot_clobber_new_one() {
        let mock = MockEngine::new();
        let gate_a = mock.gate("A");
        let gate_b = mock.gate("B");
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "A");
        m.submit_numbers(&["1", "2", "3"]).unwrap();

        m.start_new_reading().unwrap();
        m.select_spread(SpreadKind::ThreeCard).unwrap();
        m.submit_question("B").unwrap();
        let b_names: Vec<&str> = [4, 5, 6].iter().map(|n| card_name(&m, *n)).collect();
        m.submit_numbers(&["4", "5", "6"]).unwrap();

        // A reports three images, the settle marker and its interpretation.
        gate_a.add_permits(8);
        let mut stale = 0;
        while stale < 5 {
            if m.process_next().await == Some(Applied::Stale) {
                stale += 1;
            }
        }
        let session = m.session().unwrap();
        assert_eq!(session.question(), "B");
        assert!(session.interpretation().is_pending());
        assert_eq!(m.step(), Step::GeneratingReading);

        gate_b.add_permits(8);
        m.settle().await;
        let session = m.session().unwrap();
        let names: Vec<&str> = session.cards().iter().map(|c| c.card.name).collect();
        assert_eq!(names, b_names);
        let text = session.interpretation().text().unwrap();
        assert!(text.contains("\"B\""));
        assert!(!text.contains("\"A\""));
        assert_eq!(m.step(), Step::ViewingReading);
    }

    #[tokio::test]
    async fn new_reading_after_credential_fault() {
        let mock = MockEngine::new();
        mock.fail_interpretation(EngineError::NotConfigured);
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        m.submit_numbers(&["1"]).unwrap();
        m.settle().await;
        m.start_new_reading().unwrap();
        assert_eq!(m.step(), Step::AwaitingCredential);
        assert_eq!(m.fault(), None);
        assert_eq!(m.screen(), Screen::Credential { error: None });
    }

    #[tokio::test]
    async fn new_reading_after_call_failure_keeps_engine() {
        let mock = MockEngine::new();
        mock.fail_interpretation(EngineError::CallFailed("down".into()));
        let mut m = ready_for_cards(&mock, SpreadKind::Single, "q");
        m.submit_numbers(&["1"]).unwrap();
        m.settle().await;
        m.start_new_reading().unwrap();
        assert_eq!(m.step(), Step::SelectingSpread);
        assert!(m.is_configured());
        assert!(m.session().is_none());
        assert_eq!(m.fault(), None);
    }

    #[tokio::test]
    async fn locale_switch_keeps_session() {
        let mock = MockEngine::new();
        let mut m = ready_for_cards(&mock, SpreadKind::ThreeCard, "q");
        m.submit_numbers(&["1", "2", "3"]).unwrap();
        m.settle().await;
        let before = m.session().cloned();
        m.set_locale(Locale::En);
        assert_eq!(m.locale(), Locale::En);
        assert_eq!(m.session().cloned(), before);
        assert_eq!(m.session().unwrap().spread_name(), "三張牌陣");
    }
}
