//! Locale management and utilities

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use unic_langid::LanguageIdentifier;

/// Supported locales
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Locale {
    /// English (United States)
    #[default]
    #[serde(rename = "en-US")]
    English,
    /// Portuguese (Brazil)
    #[serde(rename = "pt-BR")]
    Portuguese,
}

impl Locale {
    /// Get the language tag for this locale
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Portuguese => "pt-BR",
        }
    }

    /// Parse a locale from a language tag; bare language codes are accepted
    pub fn from_code(code: &str) -> I18nResult<Self> {
        match code.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" => Ok(Self::English),
            "pt" | "pt-br" => Ok(Self::Portuguese),
            _ => Err(I18nError::UnsupportedLanguage(code.to_string())),
        }
    }

    /// Convert to Fluent LanguageIdentifier
    pub fn to_language_identifier(self) -> I18nResult<LanguageIdentifier> {
        self.code()
            .parse()
            .map_err(|_| I18nError::InvalidLanguageId(self.code().to_string()))
    }

    /// Get all supported locales
    pub const fn all() -> [Self; 2] {
        [Self::English, Self::Portuguese]
    }

    /// Fluent source shipped for this locale
    pub(crate) const fn source(self) -> &'static str {
        match self {
            Self::English => include_str!("../locales/en-US/insights.ftl"),
            Self::Portuguese => include_str!("../locales/pt-BR/insights.ftl"),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = I18nError;

    fn from_str(s: &str) -> I18nResult<Self> {
        Self::from_code(s)
    }
}
