//! Error types for the reading flow.

use thiserror::Error;

use tarot_core::{DrawError, Message};

use crate::machine::Step;

/// Result type for reading operations.
pub type ReadingResult<T> = Result<T, ReadingError>;

/// Errors returned by [`crate::ReadingMachine`] transitions.
///
/// None of these touch the live session: a rejected transition leaves the
/// machine exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadingError {
    /// User input was rejected at the current step.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The action is not available at the current step.
    #[error("cannot {action} while {step}")]
    InvalidTransition {
        /// The attempted action.
        action: &'static str,
        /// The step the machine is in.
        step: Step,
    },

    /// The chosen spread is missing from the catalog.
    #[error("unknown spread: {0}")]
    UnknownSpread(String),

    /// Engine calls need a Tokio runtime and none is running.
    #[error("no async runtime to run engine calls on")]
    NoRuntime,
}

impl ReadingError {
    /// The localized message to show inline, if this error has one.
    pub fn message(&self) -> Message {
        match self {
            Self::Validation(err) => err.message(),
            Self::InvalidTransition { .. } | Self::UnknownSpread(_) | Self::NoRuntime => {
                Message::InternalErrorRetry
            }
        }
    }
}

/// Rejected user input. Surfaced at the step that received it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The credential was empty or whitespace.
    #[error("credential is empty")]
    EmptyCredential,

    /// The question was empty or whitespace.
    #[error("question is empty")]
    EmptyQuestion,

    /// Draw numbers were rejected.
    #[error(transparent)]
    Draw(#[from] DrawError),
}

impl ValidationError {
    /// The localized message for this error.
    pub fn message(&self) -> Message {
        match self {
            Self::EmptyCredential => Message::CredentialRequired,
            Self::EmptyQuestion => Message::QuestionRequired,
            Self::Draw(err) => Message::from(err),
        }
    }
}
