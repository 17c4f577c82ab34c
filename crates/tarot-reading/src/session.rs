//! The live reading: drawn cards and the text the engine produced for them.

use tarot_core::{Card, Locale, Message, SpreadKind};

use crate::engine::{CardImage, CardPrompt};

/// One card bound into a reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnCard {
    /// The underlying card.
    pub card: Card,
    /// The 1-based number the user entered for it.
    pub number: usize,
    /// Position label for its slot, in the locale of the reading.
    pub position: String,
    /// Generated illustration. Set at most once, after creation.
    pub image: Option<CardImage>,
}

impl DrawnCard {
    /// The view the engine receives.
    pub fn prompt(&self) -> CardPrompt {
        CardPrompt {
            name: self.card.name.to_string(),
            position: self.position.clone(),
        }
    }
}

/// A text field the engine fills in asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    /// Still generating; shows a placeholder.
    Pending(Message),
    /// Genuine engine output.
    Ready(String),
    /// Generation failed; shows a failure notice.
    Failed(Message),
}

impl Narrative {
    /// Text to display in `locale`.
    pub fn render(&self, locale: Locale) -> String {
        match self {
            Self::Pending(msg) | Self::Failed(msg) => msg.render(locale),
            Self::Ready(text) => text.clone(),
        }
    }

    /// Engine output, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) => Some(text),
            _ => None,
        }
    }

    /// Whether generation is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Whether generation failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The aggregate for one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSession {
    pub(crate) generation: u64,
    pub(crate) question: String,
    pub(crate) spread: SpreadKind,
    pub(crate) spread_name: String,
    pub(crate) cards: Vec<DrawnCard>,
    pub(crate) interpretation: Narrative,
    pub(crate) summary: Narrative,
}

impl ReadingSession {
    /// A fresh reading with placeholder text.
    pub fn new(
        generation: u64,
        question: impl Into<String>,
        spread: SpreadKind,
        spread_name: impl Into<String>,
        cards: Vec<DrawnCard>,
    ) -> Self {
        Self {
            generation,
            question: question.into(),
            spread,
            spread_name: spread_name.into(),
            cards,
            interpretation: Narrative::Pending(Message::GeneratingReading),
            summary: Narrative::Pending(Message::GeneratingOracle),
        }
    }

    /// Identity of the reading; events tagged with another value are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The question, trimmed.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The chosen spread.
    pub fn spread(&self) -> SpreadKind {
        self.spread
    }

    /// Localized spread name.
    pub fn spread_name(&self) -> &str {
        &self.spread_name
    }

    /// Drawn cards in position order.
    pub fn cards(&self) -> &[DrawnCard] {
        &self.cards
    }

    /// The overall interpretation.
    pub fn interpretation(&self) -> &Narrative {
        &self.interpretation
    }

    /// The condensed oracle summary.
    pub fn summary(&self) -> &Narrative {
        &self.summary
    }

    /// Engine views of the drawn cards.
    pub fn prompts(&self) -> Vec<CardPrompt> {
        self.cards.iter().map(DrawnCard::prompt).collect()
    }

    /// First card that has an illustration.
    pub fn first_image(&self) -> Option<&CardImage> {
        self.cards.iter().find_map(|c| c.image.as_ref())
    }

    /// Render the reading as a markdown transcript.
    pub fn to_markdown(&self, locale: Locale) -> String {
        let mut out = format!("# {}\n\n", Message::ReadingTitle.render(locale));
        out.push_str(&format!(
            "**{}** {}\n\n",
            Message::YourQuestion.render(locale),
            self.question
        ));
        out.push_str(&format!(
            "**{}** {}\n\n",
            Message::SpreadLabel.render(locale),
            self.spread_name
        ));
        out.push_str(&format!("## {}\n\n", Message::DrawnCards.render(locale)));
        for drawn in &self.cards {
            out.push_str(&format!(
                "- {} ({}) #{}\n",
                drawn.card.localized_name(locale),
                drawn.position,
                drawn.number
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "## {}\n\n{}\n\n",
            Message::InterpretationLabel.render(locale),
            self.interpretation.render(locale).trim_end()
        ));
        out.push_str(&format!(
            "## {}\n\n> {}\n",
            Message::OracleLabel.render(locale),
            self.summary.render(locale).trim()
        ));
        out
    }
}
