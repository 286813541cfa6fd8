use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A display language supported by the assistant.
///
/// The wire form is the lowercase two-letter code (`"en"`, `"fr"`, `"rw"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,

    /// French
    Fr,

    /// Kinyarwanda
    Rw,
}

impl Language {
    /// Every supported language, in menu order.
    pub const ALL: [Language; 3] = [Language::En, Language::Fr, Language::Rw];

    /// The two-letter code sent to the service.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Rw => "rw",
        }
    }

    /// The language's name written in that language.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "Français",
            Language::Rw => "Kinyarwanda",
        }
    }

    /// Flag shown next to the language in menus.
    pub fn flag(self) -> &'static str {
        match self {
            Language::En => "🇬🇧",
            Language::Fr => "🇫🇷",
            Language::Rw => "🇷🇼",
        }
    }

    /// The greeting that seeds a fresh conversation.
    pub fn welcome(self) -> &'static str {
        match self {
            Language::En => {
                "👋 Hello! I'm your Irembo assistant. I can help you with IremboGov, One Stop Center, and IremboPlus services. How can I help you today?"
            }
            Language::Fr => {
                "👋 Bonjour! Je suis votre assistant Irembo. Je peux vous aider avec les services IremboGov, One Stop Center et IremboPlus. Comment puis-je vous aider aujourd'hui?"
            }
            Language::Rw => {
                "👋 Muraho! Ndi umufasha wawe wa Irembo. Nshobora kukufasha muri serivisi za IremboGov, One Stop Center, na IremboPlus. Ese nagukorera iki uyu munsi?"
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "fr" | "french" | "français" | "francais" => Ok(Language::Fr),
            "rw" | "kinyarwanda" => Ok(Language::Rw),
            _ => Err(format!(
                "Unknown language: {s}. Valid options: en, fr, rw"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Rw).unwrap(), r#""rw""#);
        let lang: Language = serde_json::from_str(r#""fr""#).unwrap();
        assert_eq!(lang, Language::Fr);
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert_eq!("Kinyarwanda".parse::<Language>(), Ok(Language::Rw));
        assert_eq!("français".parse::<Language>(), Ok(Language::Fr));
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn welcome_strings_are_distinct() {
        let en = Language::En.welcome();
        let fr = Language::Fr.welcome();
        let rw = Language::Rw.welcome();
        assert!(en.starts_with("👋 Hello!"));
        assert!(fr.starts_with("👋 Bonjour!"));
        assert!(rw.starts_with("👋 Muraho!"));
        assert_ne!(en, fr);
        assert_ne!(fr, rw);
    }
}
