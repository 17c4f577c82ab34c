//! The canonical 78-card tarot deck.
//!
//! Ids 0-21 are the Major Arcana in traditional order, followed by the four
//! suits (Wands, Cups, Swords, Pentacles), each running Ace through King.

use serde::Serialize;

use crate::locale::Locale;

/// Number of cards in a full tarot deck.
pub const DECK_SIZE: usize = 78;

/// Stable identifier of a card within the canonical deck (0-77).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CardId(pub u8);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arcana category of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Arcana {
    /// The 22 trump cards.
    Major,
    /// The 56 suited cards.
    Minor,
}

impl std::fmt::Display for Arcana {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "Major"),
            Self::Minor => write!(f, "Minor"),
        }
    }
}

/// Suit of a Minor Arcana card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Suit {
    /// Fire; will and action.
    Wands,
    /// Water; feeling and relationships.
    Cups,
    /// Air; thought and conflict.
    Swords,
    /// Earth; work and material matters.
    Pentacles,
}

impl Suit {
    /// All suits in deck order.
    pub fn all() -> &'static [Self] {
        &[Self::Wands, Self::Cups, Self::Swords, Self::Pentacles]
    }

    /// Localized suit name.
    pub fn name(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Wands, Locale::En) => "Wands",
            (Self::Cups, Locale::En) => "Cups",
            (Self::Swords, Locale::En) => "Swords",
            (Self::Pentacles, Locale::En) => "Pentacles",
            (Self::Wands, Locale::ZhTw) => "權杖",
            (Self::Cups, Locale::ZhTw) => "聖杯",
            (Self::Swords, Locale::ZhTw) => "寶劍",
            (Self::Pentacles, Locale::ZhTw) => "錢幣",
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name(Locale::En))
    }
}

/// One card identity. Defined once in [`CARDS`] and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Card {
    /// Position in the canonical deck.
    pub id: CardId,
    /// Canonical English name, used when talking to the interpretation engine.
    pub name: &'static str,
    /// Traditional Chinese display name.
    pub name_zh: &'static str,
    /// Major or Minor Arcana.
    pub arcana: Arcana,
    /// Suit, present only for Minor Arcana.
    pub suit: Option<Suit>,
}

impl Card {
    /// Display name for the given locale.
    pub fn localized_name(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.name,
            Locale::ZhTw => self.name_zh,
        }
    }

    /// Whether this card belongs to the Major Arcana.
    pub fn is_major(&self) -> bool {
        self.arcana == Arcana::Major
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

const fn major(id: u8, name: &'static str, name_zh: &'static str) -> Card {
    Card {
        id: CardId(id),
        name,
        name_zh,
        arcana: Arcana::Major,
        suit: None,
    }
}

const fn minor(id: u8, suit: Suit, name: &'static str, name_zh: &'static str) -> Card {
    Card {
        id: CardId(id),
        name,
        name_zh,
        arcana: Arcana::Minor,
        suit: Some(suit),
    }
}

/// The canonical, unshuffled deck.
pub static CARDS: [Card; DECK_SIZE] = [
    major(0, "The Fool", "愚者"),
    major(1, "The Magician", "魔術師"),
    major(2, "The High Priestess", "女祭司"),
    major(3, "The Empress", "皇后"),
    major(4, "The Emperor", "皇帝"),
    major(5, "The Hierophant", "教皇"),
    major(6, "The Lovers", "戀人"),
    major(7, "The Chariot", "戰車"),
    major(8, "Strength", "力量"),
    major(9, "The Hermit", "隱士"),
    major(10, "Wheel of Fortune", "命運之輪"),
    major(11, "Justice", "正義"),
    major(12, "The Hanged Man", "吊人"),
    major(13, "Death", "死神"),
    major(14, "Temperance", "節制"),
    major(15, "The Devil", "惡魔"),
    major(16, "The Tower", "高塔"),
    major(17, "The Star", "星星"),
    major(18, "The Moon", "月亮"),
    major(19, "The Sun", "太陽"),
    major(20, "Judgement", "審判"),
    major(21, "The World", "世界"),
    minor(22, Suit::Wands, "Ace of Wands", "權杖王牌"),
    minor(23, Suit::Wands, "Two of Wands", "權杖二"),
    minor(24, Suit::Wands, "Three of Wands", "權杖三"),
    minor(25, Suit::Wands, "Four of Wands", "權杖四"),
    minor(26, Suit::Wands, "Five of Wands", "權杖五"),
    minor(27, Suit::Wands, "Six of Wands", "權杖六"),
    minor(28, Suit::Wands, "Seven of Wands", "權杖七"),
    minor(29, Suit::Wands, "Eight of Wands", "權杖八"),
    minor(30, Suit::Wands, "Nine of Wands", "權杖九"),
    minor(31, Suit::Wands, "Ten of Wands", "權杖十"),
    minor(32, Suit::Wands, "Page of Wands", "權杖侍者"),
    minor(33, Suit::Wands, "Knight of Wands", "權杖騎士"),
    minor(34, Suit::Wands, "Queen of Wands", "權杖皇后"),
    minor(35, Suit::Wands, "King of Wands", "權杖國王"),
    minor(36, Suit::Cups, "Ace of Cups", "聖杯王牌"),
    minor(37, Suit::Cups, "Two of Cups", "聖杯二"),
    minor(38, Suit::Cups, "Three of Cups", "聖杯三"),
    minor(39, Suit::Cups, "Four of Cups", "聖杯四"),
    minor(40, Suit::Cups, "Five of Cups", "聖杯五"),
    minor(41, Suit::Cups, "Six of Cups", "聖杯六"),
    minor(42, Suit::Cups, "Seven of Cups", "聖杯七"),
    minor(43, Suit::Cups, "Eight of Cups", "聖杯八"),
    minor(44, Suit::Cups, "Nine of Cups", "聖杯九"),
    minor(45, Suit::Cups, "Ten of Cups", "聖杯十"),
    minor(46, Suit::Cups, "Page of Cups", "聖杯侍者"),
    minor(47, Suit::Cups, "Knight of Cups", "聖杯騎士"),
    minor(48, Suit::Cups, "Queen of Cups", "聖杯皇后"),
    minor(49, Suit::Cups, "King of Cups", "聖杯國王"),
    minor(50, Suit::Swords, "Ace of Swords", "寶劍王牌"),
    minor(51, Suit::Swords, "Two of Swords", "寶劍二"),
    minor(52, Suit::Swords, "Three of Swords", "寶劍三"),
    minor(53, Suit::Swords, "Four of Swords", "寶劍四"),
    minor(54, Suit::Swords, "Five of Swords", "寶劍五"),
    minor(55, Suit::Swords, "Six of Swords", "寶劍六"),
    minor(56, Suit::Swords, "Seven of Swords", "寶劍七"),
    minor(57, Suit::Swords, "Eight of Swords", "寶劍八"),
    minor(58, Suit::Swords, "Nine of Swords", "寶劍九"),
    minor(59, Suit::Swords, "Ten of Swords", "寶劍十"),
    minor(60, Suit::Swords, "Page of Swords", "寶劍侍者"),
    minor(61, Suit::Swords, "Knight of Swords", "寶劍騎士"),
    minor(62, Suit::Swords, "Queen of Swords", "寶劍皇后"),
    minor(63, Suit::Swords, "King of Swords", "寶劍國王"),
    minor(64, Suit::Pentacles, "Ace of Pentacles", "錢幣王牌"),
    minor(65, Suit::Pentacles, "Two of Pentacles", "錢幣二"),
    minor(66, Suit::Pentacles, "Three of Pentacles", "錢幣三"),
    minor(67, Suit::Pentacles, "Four of Pentacles", "錢幣四"),
    minor(68, Suit::Pentacles, "Five of Pentacles", "錢幣五"),
    minor(69, Suit::Pentacles, "Six of Pentacles", "錢幣六"),
    minor(70, Suit::Pentacles, "Seven of Pentacles", "錢幣七"),
    minor(71, Suit::Pentacles, "Eight of Pentacles", "錢幣八"),
    minor(72, Suit::Pentacles, "Nine of Pentacles", "錢幣九"),
    minor(73, Suit::Pentacles, "Ten of Pentacles", "錢幣十"),
    minor(74, Suit::Pentacles, "Page of Pentacles", "錢幣侍者"),
    minor(75, Suit::Pentacles, "Knight of Pentacles", "錢幣騎士"),
    minor(76, Suit::Pentacles, "Queen of Pentacles", "錢幣皇后"),
    minor(77, Suit::Pentacles, "King of Pentacles", "錢幣國王"),
];

/// Look up a card by its canonical id.
pub fn card_by_id(id: CardId) -> Option<&'static Card> {
    CARDS.get(usize::from(id.0))
}
