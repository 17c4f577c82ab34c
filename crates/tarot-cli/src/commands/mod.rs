pub mod deck;
pub mod draw;
pub mod read;
pub mod spreads;
pub mod svg;

use rand::SeedableRng;
use rand::rngs::StdRng;

use tarot_core::{Card, Locale};

/// A seeded RNG when `seed` is given, OS entropy otherwise.
fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Suit name, or "—" for the Major Arcana.
fn suit_label(card: &Card, locale: Locale) -> String {
    card.suit
        .map(|s| s.name(locale).to_string())
        .unwrap_or_else(|| "—".to_string())
}
