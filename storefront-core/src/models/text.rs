use serde::{Deserialize, Serialize};
use std::fmt;

use crate::preferences::Language;

/// A text value with English and Arabic variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TextRepr")]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

/// Older documents stored a single plain string.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Plain(String),
    Pair {
        #[serde(default)]
        en: Option<String>,
        #[serde(default)]
        ar: Option<String>,
    },
    Null(()),
}

impl From<TextRepr> for LocalizedText {
    fn from(repr: TextRepr) -> Self {
        match repr {
            TextRepr::Plain(en) => Self {
                en,
                ar: String::new(),
            },
            TextRepr::Pair { en, ar } => Self {
                en: en.unwrap_or_default(),
                ar: ar.unwrap_or_default(),
            },
            TextRepr::Null(()) => Self::default(),
        }
    }
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    pub fn english(en: impl Into<String>) -> Self {
        Self::new(en, String::new())
    }

    /// Returns the text for `language`, falling back to English when blank.
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Ar if !self.ar.trim().is_empty() => &self.ar,
            _ => &self.en,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty() && self.ar.trim().is_empty()
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ar.is_empty() {
            write!(f, "{}", self.en)
        } else {
            write!(f, "{} / {}", self.en, self.ar)
        }
    }
}
