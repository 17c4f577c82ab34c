//! The reading flow: session data, the step-by-step state machine, and the
//! contract every interpretation engine implements.
//!
//! A [`ReadingMachine`] owns the only live [`ReadingSession`]. Engine calls run
//! as Tokio tasks that report back through tagged [`ReadingEvent`]s; the
//! machine applies them one at a time and drops any that belong to an
//! abandoned reading.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod machine;
pub mod mock;
pub mod session;

pub use config::ReadingConfig;
pub use engine::{
    CardImage, CardPrompt, Credential, EngineError, EngineProvider, EngineSession,
    InterpretRequest, InterpretationEngine, SummaryRequest,
};
pub use error::{ReadingError, ReadingResult, ValidationError};
pub use export::{
    Background, ExportError, RenderOptions, RenderedImage, SummaryCard, SummaryRenderer,
    download_filename, export_summary,
};
pub use machine::{
    Applied, Call, EventKind, Fault, Progress, ReadingEvent, ReadingMachine, Screen, Step,
};
pub use mock::{MockCall, MockEngine, MockProvider};
pub use session::{DrawnCard, Narrative, ReadingSession};
