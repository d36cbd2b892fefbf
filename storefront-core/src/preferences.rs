//! Per-device preferences kept in local storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ValidationError;
use crate::kv::{self, KeyValueStore, KvError};

/// Country preselected in phone number inputs.
pub const COUNTRY_KEY: &str = "preferredCountry";
/// Display language.
pub const LANGUAGE_KEY: &str = "preferredLanguage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    /// Arabic renders right to left.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Ar => write!(f, "ar"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            _ => Err(format!("Invalid language '{}'. Valid options: en, ar", s)),
        }
    }
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Normalizes an ISO 3166-1 alpha-2 code to upper case.
pub fn normalize_country(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCountry(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

pub struct Preferences<'a> {
    kv: &'a dyn KeyValueStore,
    default_country: String,
}

impl<'a> Preferences<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, default_country: impl Into<String>) -> Self {
        Self {
            kv,
            default_country: default_country.into(),
        }
    }

    /// Stored country, or the default when unset or unreadable.
    pub fn country(&self) -> Result<String, PreferenceError> {
        let stored: Option<String> = kv::get_as(self.kv, COUNTRY_KEY)?;
        match stored.as_deref().map(normalize_country) {
            Some(Ok(code)) => Ok(code),
            Some(Err(e)) => {
                tracing::warn!("Ignoring stored country: {}", e);
                Ok(self.default_country.clone())
            }
            None => Ok(self.default_country.clone()),
        }
    }

    pub fn set_country(&self, code: &str) -> Result<String, PreferenceError> {
        let code = normalize_country(code)?;
        kv::set_as(self.kv, COUNTRY_KEY, &code)?;
        Ok(code)
    }

    pub fn language(&self) -> Result<Language, PreferenceError> {
        let stored: Option<String> = kv::get_as(self.kv, LANGUAGE_KEY)?;
        Ok(stored
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }

    pub fn set_language(&self, language: Language) -> Result<(), PreferenceError> {
        kv::set_as(self.kv, LANGUAGE_KEY, &language)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use serde_json::json;

    #[test]
    fn test_country_defaults_until_set() {
        let kv = MemoryKv::new();
        let prefs = Preferences::new(&kv, "US");
        assert_eq!(prefs.country().unwrap(), "US");

        assert_eq!(prefs.set_country(" sa ").unwrap(), "SA");
        assert_eq!(prefs.country().unwrap(), "SA");
        assert_eq!(kv.get(COUNTRY_KEY).unwrap(), Some(json!("SA")));
    }

    #[test]
    fn test_invalid_country_rejected() {
        let kv = MemoryKv::new();
        let prefs = Preferences::new(&kv, "US");
        assert!(matches!(
            prefs.set_country("USA"),
            Err(PreferenceError::Validation(ValidationError::InvalidCountry(_)))
        ));
        assert!(matches!(
            prefs.set_country("1A"),
            Err(PreferenceError::Validation(_))
        ));
        assert!(kv.is_empty());
    }

    #[test]
    fn test_bad_stored_country_falls_back() {
        let kv = MemoryKv::new();
        kv.set(COUNTRY_KEY, json!("nowhere")).unwrap();
        assert_eq!(Preferences::new(&kv, "AE").country().unwrap(), "AE");
    }

    #[test]
    fn test_language_round_trip() {
        let kv = MemoryKv::new();
        let prefs = Preferences::new(&kv, "US");
        assert_eq!(prefs.language().unwrap(), Language::En);

        prefs.set_language(Language::Ar).unwrap();
        assert_eq!(prefs.language().unwrap(), Language::Ar);
        assert!(prefs.language().unwrap().is_rtl());
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("Arabic".parse::<Language>().unwrap(), Language::Ar);
        assert!("fr".parse::<Language>().is_err());
    }
}
