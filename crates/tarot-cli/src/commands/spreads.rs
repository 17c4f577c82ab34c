use colored::Colorize;

use tarot_core::{Locale, Message, SpreadCatalog};

pub fn run(locale: Locale) -> Result<(), String> {
    let catalog = SpreadCatalog::standard();

    println!("  {}\n", Message::SelectSpreadTitle.render(locale).bold());
    for def in catalog.definitions() {
        println!(
            "  {} [{}] {}",
            def.name(locale).bold(),
            def.kind().slug(),
            Message::SpreadCardCount {
                count: def.card_count()
            }
            .render(locale)
            .dimmed()
        );
        println!("    {}", def.description(locale));
        for (i, position) in def.positions(locale).iter().enumerate() {
            println!("    {:>2}. {position}", i + 1);
        }
        println!();
    }
    println!("  {}", Message::TarotDisclaimer.render(locale).dimmed());

    Ok(())
}
