//! Summary card export.
//!
//! The card is a flat view of a finished reading. Rasterizing it is left to a
//! [`SummaryRenderer`]; this module decides when a card may be exported, which
//! background it gets, and what the download is called.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use tarot_core::{Locale, Message};

use crate::engine::CardImage;
use crate::session::ReadingSession;

/// Fill behind the card when no card image is available.
pub const SOLID_BACKGROUND: &str = "#334155";
/// Dark overlay drawn over an image background.
pub const IMAGE_OVERLAY: &str = "rgba(0, 0, 0, 0.65)";

/// Why an export failed. Never affects the session.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The summary is still generating.
    #[error("summary is not ready")]
    NotReady,

    /// The renderer failed.
    #[error("render failed: {0}")]
    Render(String),

    /// Writing the file failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// The one-shot notice to show the user.
    pub fn message(&self) -> Message {
        match self {
            Self::NotReady => Message::DownloadNotReady,
            Self::Render(_) | Self::Io(_) => Message::DownloadFailed,
        }
    }
}

/// What sits behind the card text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// A card image under a dark overlay.
    Image {
        /// The image.
        image: CardImage,
        /// Overlay colour.
        overlay: &'static str,
    },
    /// A flat colour.
    Solid(&'static str),
}

/// Rendering configuration handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixel density multiplier.
    pub scale: u32,
    /// Whether images from other origins may be embedded.
    pub allow_cross_origin: bool,
    /// Background treatment.
    pub background: Background,
}

impl RenderOptions {
    /// Options for `card`: image background when the card has one.
    pub fn for_card(card: &SummaryCard) -> Self {
        let background = match &card.background {
            Some(image) => Background::Image {
                image: image.clone(),
                overlay: IMAGE_OVERLAY,
            },
            None => Background::Solid(SOLID_BACKGROUND),
        };
        Self {
            scale: 2,
            allow_cross_origin: true,
            background,
        }
    }
}

/// Flat, localized view of a reading for the summary card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    /// Card heading.
    pub title: String,
    /// Label before the question.
    pub question_label: String,
    /// The question.
    pub question: String,
    /// Label before the spread name.
    pub spread_label: String,
    /// Spread name.
    pub spread_name: String,
    /// Label before the card list.
    pub cards_label: String,
    /// One "name (position)" line per card.
    pub cards: Vec<String>,
    /// Label before the oracle text.
    pub oracle_label: String,
    /// Oracle text, or its failure notice.
    pub oracle: String,
    /// Footer line.
    pub footer: String,
    /// First card image, used as background.
    pub background: Option<CardImage>,
}

impl SummaryCard {
    /// Build the card. Refused while the summary is still generating.
    pub fn from_session(session: &ReadingSession, locale: Locale) -> Result<Self, ExportError> {
        if session.summary().is_pending() {
            return Err(ExportError::NotReady);
        }
        Ok(Self {
            title: Message::SummaryCardTitle.render(locale),
            question_label: Message::YourQuestion.render(locale),
            question: session.question().to_string(),
            spread_label: Message::SpreadLabel.render(locale),
            spread_name: session.spread_name().to_string(),
            cards_label: Message::DrawnCards.render(locale),
            cards: session
                .cards()
                .iter()
                .map(|c| format!("{} ({})", c.card.localized_name(locale), c.position))
                .collect(),
            oracle_label: Message::OracleLabel.render(locale),
            oracle: session.summary().render(locale),
            footer: Message::SummaryCardFooter.render(locale),
            background: session.first_image().cloned(),
        })
    }
}

/// Encoded output of a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// File extension without the dot.
    pub extension: &'static str,
    /// Encoded image.
    pub bytes: Vec<u8>,
}

/// Turns a summary card into an image.
pub trait SummaryRenderer {
    /// Render `card` with `options`.
    fn render(
        &self,
        card: &SummaryCard,
        options: &RenderOptions,
    ) -> Result<RenderedImage, ExportError>;
}

static UNSAFE_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)[^a-z0-9\x{4e00}-\x{9fa5}]").ok());

/// Download file name: `TarotReading_<question prefix>_<ms>.<ext>`.
///
/// Only the first 15 characters of the question are used; anything other
/// than ASCII letters, digits and CJK ideographs becomes `_`.
pub fn download_filename(question: &str, timestamp_ms: i64, extension: &str) -> String {
    let prefix: String = question.chars().take(15).collect();
    let safe = match UNSAFE_CHARS.as_ref() {
        Some(re) => re.replace_all(&prefix, "_").into_owned(),
        None => prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    };
    format!("TarotReading_{safe}_{timestamp_ms}.{extension}")
}

/// Render the summary card for `session` and write it into `dir`.
pub fn export_summary(
    session: &ReadingSession,
    locale: Locale,
    renderer: &dyn SummaryRenderer,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let card = SummaryCard::from_session(session, locale)?;
    let options = RenderOptions::for_card(&card);
    let image = renderer.render(&card, &options)?;
    let name = download_filename(
        session.question(),
        chrono::Utc::now().timestamp_millis(),
        image.extension,
    );
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, &image.bytes)?;
    tracing::info!(path = %path.display(), "summary card written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use tarot_core::{CARDS, SpreadKind};

    use super::*;
    use crate::session::{DrawnCard, Narrative};

    struct TextRenderer;

    impl SummaryRenderer for TextRenderer {
        fn render(
            &self,
            card: &SummaryCard,
            options: &RenderOptions,
        ) -> Result<RenderedImage, ExportError> {
            Ok(RenderedImage {
                mime_type: "text/plain".into(),
                extension: "txt",
                bytes: format!("{}|{}|{:?}", card.title, card.oracle, options.scale).into_bytes(),
            })
        }
    }

    struct BrokenRenderer;

    impl SummaryRenderer for BrokenRenderer {
        fn render(&self, _: &SummaryCard, _: &RenderOptions) -> Result<RenderedImage, ExportError> {
            Err(ExportError::Render("no fonts".into()))
        }
    }

    fn session(with_image: bool) -> ReadingSession {
        let cards = vec![
            DrawnCard {
                card: CARDS[19],
                number: 8,
                position: "Guidance".into(),
                image: with_image.then(|| CardImage::from_bytes("image/jpeg", b"sun")),
            },
        ];
        ReadingSession::new(1, "How do I find calm?", SpreadKind::Single, "Single Card", cards)
    }

    #[test]
    fn pending_summary_not_exportable() {
        let err = SummaryCard::from_session(&session(false), Locale::En).unwrap_err();
        assert!(matches!(err, ExportError::NotReady));
        assert_eq!(err.message(), Message::DownloadNotReady);
    }

    #[test]
    fn failed_summary_is_exportable() {
        let mut s = session(false);
        s.summary = Narrative::Failed(Message::OracleFailed);
        let card = SummaryCard::from_session(&s, Locale::En).unwrap();
        assert_eq!(card.oracle, "Oracle's Insight generation failed.");
        assert_eq!(card.cards, vec!["The Sun (Guidance)".to_string()]);
    }

    #[test]
    fn background_choice() {
        let mut s = session(true);
        s.summary = Narrative::Ready("Breathe.".into());
        let card = SummaryCard::from_session(&s, Locale::En).unwrap();
        let options = RenderOptions::for_card(&card);
        assert_eq!(options.scale, 2);
        assert!(options.allow_cross_origin);
        assert!(matches!(options.background, Background::Image { overlay: IMAGE_OVERLAY, .. }));

        let mut s = session(false);
        s.summary = Narrative::Ready("Breathe.".into());
        let card = SummaryCard::from_session(&s, Locale::En).unwrap();
        assert_eq!(
            RenderOptions::for_card(&card).background,
            Background::Solid("#334155")
        );
    }

    #[test]
    fn filename_sanitized() {
        assert_eq!(
            download_filename("How do I find calm?", 1700000000000, "png"),
            "TarotReading_How_do_I_find_c_1700000000000.png"
        );
        assert_eq!(
            download_filename("我最近的事業發展方向如何？", 5, "svg"),
            "TarotReading_我最近的事業發展方向如何__5.svg"
        );
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(false);
        s.summary = Narrative::Ready("Breathe.".into());
        let path = export_summary(&s, Locale::En, &TextRenderer, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("TarotReading_How_do_I_find_c_"));
        assert!(name.ends_with(".txt"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body, "Tarot Reading Summary|Breathe.|2");
    }

    #[test]
    fn render_failure_surfaces_as_download_failed() {
        let mut s = session(false);
        s.summary = Narrative::Ready("Breathe.".into());
        let before = s.clone();
        let dir = tempfile::tempdir().unwrap();
        let err = export_summary(&s, Locale::En, &BrokenRenderer, dir.path()).unwrap_err();
        assert_eq!(err.message(), Message::DownloadFailed);
        assert_eq!(s, before);
    }
}
