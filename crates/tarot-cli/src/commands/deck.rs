use comfy_table::{ContentArrangement, Table};

use tarot_core::{CARDS, Card, Locale};

pub fn run(locale: Locale, major_only: bool, format: &str) -> Result<(), String> {
    let cards: Vec<&Card> = CARDS
        .iter()
        .filter(|c| !major_only || c.is_major())
        .collect();

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&cards)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        "table" => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Id", "Card", "Arcana", "Suit"]);
            for card in &cards {
                table.add_row(vec![
                    card.id.0.to_string(),
                    card.localized_name(locale).to_string(),
                    card.arcana.to_string(),
                    super::suit_label(card, locale),
                ]);
            }
            println!("{table}");
            println!();
            println!("  {} cards", cards.len());
        }
        _ => {
            return Err(format!(
                "unsupported format: \"{format}\". Use: table, json"
            ));
        }
    }

    Ok(())
}
