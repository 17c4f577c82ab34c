use comfy_table::{ContentArrangement, Table};

use tarot_core::{CoreError, Deck, Locale, Message, SpreadCatalog, SpreadKind};

pub fn run(
    locale: Locale,
    spread: &str,
    seed: Option<u64>,
    numbers: &[String],
) -> Result<(), String> {
    let kind = SpreadKind::parse(spread).map_err(|e| e.to_string())?;
    let catalog = SpreadCatalog::standard();
    let def = catalog
        .get(kind)
        .ok_or_else(|| CoreError::SpreadNotConfigured(kind).to_string())?;

    let deck = Deck::standard().shuffled(&mut super::rng(seed));
    let picks = tarot_core::draw(&deck, numbers, def.card_count())
        .map_err(|e| Message::from(&e).render(locale))?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Position", "Number", "Card", "Suit"]);
    for (i, (number, card)) in picks.iter().enumerate() {
        table.add_row(vec![
            def.position_label(i, locale),
            number.to_string(),
            card.localized_name(locale).to_string(),
            super::suit_label(card, locale),
        ]);
    }

    println!("  {}\n", def.name(locale));
    println!("{table}");

    Ok(())
}
