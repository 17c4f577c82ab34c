//! Error types for the core crate.

use crate::spread::SpreadKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by deck, spread, and locale lookups.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A spread name did not match any variant.
    #[error("unknown spread: \"{0}\" (use: single, three, celtic)")]
    UnknownSpread(String),

    /// A locale tag did not match any supported locale.
    #[error("unknown locale: \"{0}\" (use: zh-TW, en)")]
    UnknownLocale(String),

    /// A spread definition whose position labels do not match its card count.
    #[error("spread {spread} draws {cards} cards but has {positions} position labels")]
    PositionMismatch {
        /// The offending spread.
        spread: SpreadKind,
        /// Declared card count.
        cards: usize,
        /// Number of position labels supplied.
        positions: usize,
    },

    /// The spread is not present in the catalog.
    #[error("spread {0} is not configured")]
    SpreadNotConfigured(SpreadKind),
}

/// Why a set of entered draw numbers was rejected.
///
/// Positions are 1-based, matching what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The number of slots does not match the spread.
    #[error("expected {expected} numbers, got {got}")]
    WrongCount {
        /// Cards the spread requires.
        expected: usize,
        /// Slots submitted.
        got: usize,
    },

    /// A slot was left empty.
    #[error("missing number at position {position}")]
    MissingNumber {
        /// 1-based slot.
        position: usize,
    },

    /// A slot did not hold an integer within the deck.
    #[error("invalid number \"{input}\" at position {position}")]
    InvalidNumber {
        /// The raw text entered.
        input: String,
        /// 1-based slot.
        position: usize,
    },

    /// The same number was entered twice.
    #[error("duplicate number {number}")]
    DuplicateNumber {
        /// The repeated value.
        number: usize,
    },
}
