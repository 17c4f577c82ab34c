//! Supported display locales.

use serde::{Deserialize, Serialize};

/// A display locale. Traditional Chinese is the default and fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Traditional Chinese (Taiwan).
    #[default]
    #[serde(rename = "zh-TW")]
    ZhTw,
    /// English.
    #[serde(rename = "en")]
    En,
}

impl Locale {
    /// Parse a locale tag such as `zh-TW` or `en`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "zh-tw" | "zh" | "tw" | "zh-hant" => Some(Self::ZhTw),
            "en" | "en-us" | "en-gb" | "english" => Some(Self::En),
            _ => None,
        }
    }

    /// All supported locales.
    pub fn all() -> &'static [Self] {
        &[Self::ZhTw, Self::En]
    }

    /// BCP 47 tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::ZhTw => "zh-TW",
            Self::En => "en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A pair of strings, one per supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized {
    /// English text.
    pub en: &'static str,
    /// Traditional Chinese text.
    pub zh: &'static str,
}

impl Localized {
    /// Build a localized pair.
    pub const fn new(en: &'static str, zh: &'static str) -> Self {
        Self { en, zh }
    }

    /// Pick the text for `locale`.
    pub fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en,
            Locale::ZhTw => self.zh,
        }
    }
}
