//! SVG rendering of the summary card.

use tarot_reading::{
    Background, ExportError, RenderOptions, RenderedImage, SummaryCard, SummaryRenderer,
};

const WIDTH: u32 = 600;
const MARGIN: u32 = 40;
const LINE_HEIGHT: u32 = 26;
/// Wrap width in half-width columns; CJK characters count double.
const WRAP_COLUMNS: usize = 56;

/// Renders a [`SummaryCard`] as a standalone SVG document.
pub struct SvgRenderer;

impl SummaryRenderer for SvgRenderer {
    fn render(
        &self,
        card: &SummaryCard,
        options: &RenderOptions,
    ) -> Result<RenderedImage, ExportError> {
        let mut body = String::new();
        let mut y = MARGIN + 16;

        body.push_str(&text_line(
            WIDTH / 2,
            y,
            24,
            "#f5d0fe",
            "middle",
            "bold",
            &card.title,
        ));
        y += LINE_HEIGHT * 2;

        let sections = [
            (&card.question_label, vec![card.question.clone()]),
            (&card.spread_label, vec![card.spread_name.clone()]),
            (&card.cards_label, card.cards.clone()),
            (&card.oracle_label, vec![card.oracle.clone()]),
        ];
        for (label, lines) in sections {
            body.push_str(&text_line(MARGIN, y, 16, "#e9d5ff", "start", "bold", label));
            y += LINE_HEIGHT;
            for line in lines.iter().flat_map(|l| wrap(l, WRAP_COLUMNS)) {
                body.push_str(&text_line(MARGIN + 12, y, 15, "#f8fafc", "start", "normal", &line));
                y += LINE_HEIGHT;
            }
            y += LINE_HEIGHT / 2;
        }

        y += LINE_HEIGHT / 2;
        body.push_str(&text_line(
            WIDTH / 2,
            y,
            12,
            "#cbd5e1",
            "middle",
            "normal",
            &card.footer,
        ));
        let height = y + MARGIN;

        let background = match &options.background {
            Background::Image { image, overlay } => {
                let cross_origin = if options.allow_cross_origin {
                    r#" crossorigin="anonymous""#
                } else {
                    ""
                };
                format!(
                    "  <image href=\"{}\" x=\"0\" y=\"0\" width=\"{WIDTH}\" height=\"{height}\" preserveAspectRatio=\"xMidYMid slice\"{cross_origin}/>\n  <rect width=\"{WIDTH}\" height=\"{height}\" fill=\"{overlay}\"/>\n",
                    image.data_uri()
                )
            }
            Background::Solid(color) => {
                format!("  <rect width=\"{WIDTH}\" height=\"{height}\" fill=\"{color}\"/>\n")
            }
        };

        let scale = options.scale.max(1);
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {WIDTH} {height}\" font-family=\"Georgia, 'Noto Serif TC', serif\">\n",
            WIDTH * scale,
            height * scale
        ));
        svg.push_str(&background);
        svg.push_str(&body);
        svg.push_str("</svg>\n");

        Ok(RenderedImage {
            mime_type: "image/svg+xml".to_string(),
            extension: "svg",
            bytes: svg.into_bytes(),
        })
    }
}

fn text_line(
    x: u32,
    y: u32,
    size: u32,
    fill: &str,
    anchor: &str,
    weight: &str,
    text: &str,
) -> String {
    format!(
        "  <text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" fill=\"{fill}\" text-anchor=\"{anchor}\" font-weight=\"{weight}\">{}</text>\n",
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn column_width(c: char) -> usize {
    if c.is_ascii() { 1 } else { 2 }
}

/// Greedy wrap on spaces; runs without spaces (CJK text) break anywhere.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for word in paragraph.split_inclusive(' ') {
            let word_width: usize = word.chars().map(column_width).sum();
            if used + word_width > columns && !line.is_empty() {
                lines.push(line.trim_end().to_string());
                line.clear();
                used = 0;
            }
            if word_width > columns {
                for c in word.chars() {
                    let w = column_width(c);
                    if used + w > columns {
                        lines.push(std::mem::take(&mut line));
                        used = 0;
                    }
                    line.push(c);
                    used += w;
                }
            } else {
                line.push_str(word);
                used += word_width;
            }
        }
        if !line.trim().is_empty() {
            lines.push(line.trim_end().to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use tarot_reading::CardImage;

    use super::*;

    fn card() -> SummaryCard {
        SummaryCard {
            title: "Tarot Reading Summary".into(),
            question_label: "Your Question:".into(),
            question: "Is <this> the way?".into(),
            spread_label: "Spread:".into(),
            spread_name: "Single Card".into(),
            cards_label: "Drawn Cards:".into(),
            cards: vec!["The Star (Guidance)".into()],
            oracle_label: "Oracle's Insight:".into(),
            oracle: "Hope returns.".into(),
            footer: "Mystic Oracle Tarot Insights".into(),
            background: None,
        }
    }

    #[test]
    fn solid_background_and_escaping() {
        let card = card();
        let image = SvgRenderer
            .render(&card, &RenderOptions::for_card(&card))
            .unwrap();
        let svg = String::from_utf8(image.bytes).unwrap();
        assert_eq!(image.extension, "svg");
        assert!(svg.contains(r##"fill="#334155""##));
        assert!(svg.contains("Is &lt;this&gt; the way?"));
        assert!(svg.contains(r#"width="1200""#));
    }

    #[test]
    fn image_background_gets_overlay() {
        let mut card = card();
        card.background = Some(CardImage::from_bytes("image/jpeg", b"star"));
        let svg = String::from_utf8(
            SvgRenderer
                .render(&card, &RenderOptions::for_card(&card))
                .unwrap()
                .bytes,
        )
        .unwrap();
        assert!(svg.contains("data:image/jpeg;base64,"));
        assert!(svg.contains("rgba(0, 0, 0, 0.65)"));
        assert!(svg.contains(r#"crossorigin="anonymous""#));
    }

    #[test]
    fn wraps_latin_and_cjk() {
        assert_eq!(wrap("one two three", 8), vec!["one two", "three"]);
        assert_eq!(wrap("塔羅牌占卜", 4), vec!["塔羅", "牌占", "卜"]);
        assert!(wrap("", 10).is_empty());
    }
}
