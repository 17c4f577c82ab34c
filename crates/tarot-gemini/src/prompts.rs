//! Prompt text sent to the models.

use tarot_core::Locale;
use tarot_reading::{CardPrompt, InterpretRequest, SummaryRequest};

fn answer_language(locale: Locale) -> &'static str {
    match locale {
        Locale::ZhTw => "Traditional Chinese (Taiwan)",
        Locale::En => "English",
    }
}

fn card_list(cards: &[CardPrompt], separator: &str) -> String {
    cards
        .iter()
        .map(|c| format!("{} (position: {})", c.name, c.position))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Prompt for the full interpretation.
pub fn interpretation(request: &InterpretRequest) -> String {
    format!(
        "You are a knowledgeable and compassionate tarot reader.\n\
         The querent asks: \"{question}\"\n\
         They drew {count} cards for the \"{spread}\" spread: {cards}.\n\n\
         Give a clear, thoughtful reading:\n\
         1. Explain each card in its position and how it bears on the question.\n\
         2. Bring the cards together into an overall insight, advice or guidance.\n\
         Write warmly, answer in {language}, and do not use markdown such as asterisks for bold.",
        question = request.question,
        count = request.cards.len(),
        spread = request.spread_name,
        cards = card_list(&request.cards, ", "),
        language = answer_language(request.locale),
    )
}

/// Prompt for the condensed oracle.
pub fn summary(request: &SummaryRequest) -> String {
    format!(
        "You are a tarot sage with a gift for brevity. The querent asked \"{question}\" \
         and drew: {cards}.\n\
         The full reading was:\n\"{interpretation}\"\n\n\
         Condense it into one or two sentences, at most 50 characters, that capture the \
         outcome, the core insight or the most important action. Make it read like a proverb \
         for a summary card. Answer in {language} with the sentence only, no preamble.",
        question = request.question,
        cards = card_list(&request.cards, "; "),
        interpretation = request.interpretation,
        language = answer_language(request.locale),
    )
}

/// Prompt for one card illustration.
pub fn card_image(card_name: &str) -> String {
    format!(
        "A charming Japanese anime style (kawaii, chibi) tarot card illustration of '{card_name}'. \
         Show the card's iconic symbolism in an adorable way: dynamic composition, vibrant soft \
         pastel colors, characters with large expressive eyes, and a mystical, ethereal \
         atmosphere with a playful touch."
    )
}
