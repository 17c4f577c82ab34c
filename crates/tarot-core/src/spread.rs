//! Spread layouts: how many cards are drawn and what each position means.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::locale::{Locale, Localized};

/// A spread variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadKind {
    /// One card of guidance.
    Single,
    /// Past, present, future.
    ThreeCard,
    /// The ten-card Celtic Cross.
    CelticCross,
}

impl SpreadKind {
    /// All variants in menu order.
    pub fn all() -> &'static [Self] {
        &[Self::Single, Self::ThreeCard, Self::CelticCross]
    }

    /// Parse a variant from user input.
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "single" | "one" | "1" | "single card" => Ok(Self::Single),
            "three" | "3" | "three card" | "past present future" => Ok(Self::ThreeCard),
            "celtic" | "celtic cross" | "cross" | "10" => Ok(Self::CelticCross),
            _ => Err(CoreError::UnknownSpread(s.to_string())),
        }
    }

    /// Short identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::ThreeCard => "three",
            Self::CelticCross => "celtic",
        }
    }
}

impl std::fmt::Display for SpreadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Fixed configuration for one spread variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadDefinition {
    kind: SpreadKind,
    card_count: usize,
    name: Localized,
    description: Localized,
    positions: Vec<Localized>,
}

impl SpreadDefinition {
    /// Build a definition. Fails unless there is exactly one position label per card.
    pub fn new(
        kind: SpreadKind,
        card_count: usize,
        name: Localized,
        description: Localized,
        positions: Vec<Localized>,
    ) -> CoreResult<Self> {
        if positions.len() != card_count {
            return Err(CoreError::PositionMismatch {
                spread: kind,
                cards: card_count,
                positions: positions.len(),
            });
        }
        Ok(Self {
            kind,
            card_count,
            name,
            description,
            positions,
        })
    }

    /// The variant this definition describes.
    pub fn kind(&self) -> SpreadKind {
        self.kind
    }

    /// Number of cards to draw.
    pub fn card_count(&self) -> usize {
        self.card_count
    }

    /// Localized display name.
    pub fn name(&self, locale: Locale) -> &'static str {
        self.name.get(locale)
    }

    /// Localized description.
    pub fn description(&self, locale: Locale) -> &'static str {
        self.description.get(locale)
    }

    /// Localized label of every position, in draw order.
    pub fn positions(&self, locale: Locale) -> Vec<&'static str> {
        self.positions.iter().map(|p| p.get(locale)).collect()
    }

    /// Label of the position at 0-based `index`, falling back to "Card N".
    pub fn position_label(&self, index: usize, locale: Locale) -> String {
        match self.positions.get(index) {
            Some(label) => label.get(locale).to_string(),
            None => crate::message::Message::CardLabel { index: index + 1 }.render(locale),
        }
    }
}

/// Every spread the application offers, keyed by variant.
#[derive(Debug, Clone)]
pub struct SpreadCatalog {
    definitions: Vec<SpreadDefinition>,
}

impl SpreadCatalog {
    /// The built-in single, three-card, and Celtic Cross spreads.
    pub fn standard() -> Self {
        Self {
            definitions: vec![single(), three_card(), celtic_cross()],
        }
    }

    /// A catalog from explicit definitions. Later entries replace earlier ones
    /// of the same kind.
    pub fn from_definitions(definitions: Vec<SpreadDefinition>) -> Self {
        let mut catalog = Self {
            definitions: Vec::new(),
        };
        for def in definitions {
            catalog.insert(def);
        }
        catalog
    }

    /// Add or replace the definition for its variant.
    pub fn insert(&mut self, definition: SpreadDefinition) {
        self.definitions.retain(|d| d.kind != definition.kind);
        self.definitions.push(definition);
    }

    /// Definition for `kind`, if configured.
    pub fn get(&self, kind: SpreadKind) -> Option<&SpreadDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    /// All definitions in catalog order.
    pub fn definitions(&self) -> &[SpreadDefinition] {
        &self.definitions
    }
}

impl Default for SpreadCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn single() -> SpreadDefinition {
    SpreadDefinition {
        kind: SpreadKind::Single,
        card_count: 1,
        name: Localized::new("Single Card", "單張牌"),
        description: Localized::new(
            "A quick, focused answer or a piece of guidance for the moment.",
            "針對單一問題給出直接而聚焦的指引。",
        ),
        positions: vec![Localized::new("Guidance", "指引")],
    }
}

fn three_card() -> SpreadDefinition {
    SpreadDefinition {
        kind: SpreadKind::ThreeCard,
        card_count: 3,
        name: Localized::new("Three-Card Spread", "三張牌陣"),
        description: Localized::new(
            "Past, present, and future: how the situation grew and where it is heading.",
            "過去、現在與未來：了解事情的來龍去脈與發展方向。",
        ),
        positions: vec![
            Localized::new("Past", "過去"),
            Localized::new("Present", "現在"),
            Localized::new("Future", "未來"),
        ],
    }
}

fn celtic_cross() -> SpreadDefinition {
    SpreadDefinition {
        kind: SpreadKind::CelticCross,
        card_count: 10,
        name: Localized::new("Celtic Cross", "凱爾特十字"),
        description: Localized::new(
            "A detailed ten-card look at a complex situation, its influences and its likely outcome.",
            "以十張牌深入剖析複雜的處境、內外影響與可能的結果。",
        ),
        positions: vec![
            Localized::new("Present Situation", "現況"),
            Localized::new("Challenge", "挑戰"),
            Localized::new("Foundation", "根基"),
            Localized::new("Recent Past", "近期的過去"),
            Localized::new("Potential", "潛在目標"),
            Localized::new("Near Future", "近期的未來"),
            Localized::new("Self", "自我"),
            Localized::new("Environment", "外在環境"),
            Localized::new("Hopes and Fears", "希望與恐懼"),
            Localized::new("Outcome", "最終結果"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_match_card_count() {
        let catalog = SpreadCatalog::standard();
        for kind in SpreadKind::all() {
            let def = catalog.get(*kind).unwrap();
            for locale in Locale::all() {
                assert_eq!(def.positions(*locale).len(), def.card_count(), "{kind}");
            }
        }
    }

    #[test]
    fn card_counts() {
        let catalog = SpreadCatalog::standard();
        let counts: Vec<usize> = catalog.definitions().iter().map(|d| d.card_count()).collect();
        assert_eq!(counts, vec![1, 3, 10]);
    }

    #[test]
    fn parse_variants() {
        assert_eq!(SpreadKind::parse("single").unwrap(), SpreadKind::Single);
        assert_eq!(SpreadKind::parse("Three-Card").unwrap(), SpreadKind::ThreeCard);
        assert_eq!(SpreadKind::parse("celtic_cross").unwrap(), SpreadKind::CelticCross);
        assert!(matches!(
            SpreadKind::parse("horseshoe"),
            Err(CoreError::UnknownSpread(s)) if s == "horseshoe"
        ));
    }

    #[test]
    fn slug_round_trips() {
        for kind in SpreadKind::all() {
            assert_eq!(SpreadKind::parse(kind.slug()).unwrap(), *kind);
        }
    }

    #[test]
    fn new_rejects_mismatched_positions() {
        let err = SpreadDefinition::new(
            SpreadKind::ThreeCard,
            3,
            Localized::new("Broken", "壞"),
            Localized::new("", ""),
            vec![Localized::new("Only", "唯一")],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PositionMismatch { cards: 3, positions: 1, .. }));
    }

    #[test]
    fn position_label_fallback() {
        let def = SpreadCatalog::standard()
            .get(SpreadKind::ThreeCard)
            .cloned()
            .unwrap();
        assert_eq!(def.position_label(1, Locale::ZhTw), "現在");
        assert_eq!(def.position_label(4, Locale::En), "Card 5");
        assert_eq!(def.position_label(4, Locale::ZhTw), "第 5 張牌");
    }

    #[test]
    fn insert_replaces_same_kind() {
        let mut catalog = SpreadCatalog::standard();
        let empty = SpreadDefinition::new(
            SpreadKind::Single,
            0,
            Localized::new("Empty", "空"),
            Localized::new("", ""),
            Vec::new(),
        )
        .unwrap();
        catalog.insert(empty);
        assert_eq!(catalog.definitions().len(), 3);
        assert_eq!(catalog.get(SpreadKind::Single).unwrap().card_count(), 0);
    }
}
