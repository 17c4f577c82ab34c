//! Ordered decks, shuffling, and draw-number resolution.

use rand::Rng;

use crate::card::{CARDS, Card};

/// An ordered sequence of cards.
///
/// [`Deck::standard`] is the canonical order; every reading works from a
/// [`Deck::shuffled`] copy of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The canonical, unshuffled 78-card deck.
    pub fn standard() -> Self {
        Self {
            cards: CARDS.to_vec(),
        }
    }

    /// Build a deck from an arbitrary card sequence.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Cards in deck order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// A uniformly shuffled copy of this deck. `self` is left untouched.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            cards: shuffle(&self.cards, rng),
        }
    }

    /// Resolve a 1-based draw number to the card at that position.
    ///
    /// Returns `None` when `number` is 0 or larger than the deck.
    pub fn resolve(&self, number: usize) -> Option<&Card> {
        number.checked_sub(1).and_then(|i| self.cards.get(i))
    }
}

/// Fisher-Yates shuffle of a copy of `cards`.
///
/// Walks from the last index down to 1, swapping each element with a
/// uniformly chosen index at or below it.
pub fn shuffle<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Card> {
    let mut out = cards.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
