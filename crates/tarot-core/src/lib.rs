//! Core types for the tarot reader: cards, decks, spreads, and messages.
//!
//! Nothing here talks to an interpretation engine. The reading flow lives in
//! `tarot-reading`; this crate only knows what a deck looks like, how draw
//! numbers are validated, and how every user-facing string is rendered.

/// The 78 cards of the standard deck.
pub mod card;
/// Ordered decks and Fisher-Yates shuffling.
pub mod deck;
/// Validation and resolution of user-entered draw numbers.
pub mod draw;
/// Error types used throughout the crate.
pub mod error;
/// Display locales and localized string pairs.
pub mod locale;
/// The typed catalog of user-facing messages.
pub mod message;
/// Spread variants and their position labels.
pub mod spread;

/// Re-export card types.
pub use card::{Arcana, CARDS, Card, CardId, DECK_SIZE, Suit, card_by_id};
/// Re-export the deck.
pub use deck::Deck;
/// Re-export draw validation.
pub use draw::{draw, validate_numbers};
/// Re-export error types.
pub use error::{CoreError, CoreResult, DrawError};
/// Re-export locale types.
pub use locale::{Locale, Localized};
/// Re-export the message catalog.
pub use message::Message;
/// Re-export spread types.
pub use spread::{SpreadCatalog, SpreadDefinition, SpreadKind};
