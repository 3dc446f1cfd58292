//! Fluent bundle loading and message formatting

use crate::error::{I18nError, I18nResult};
use crate::locale::Locale;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::fmt;
use tracing::{debug, warn};

/// Formats messages of one locale.
///
/// Resources are compiled into the binary, so construction only fails on a
/// malformed `.ftl` file.
pub struct Localizer {
    locale: Locale,
    bundle: FluentBundle<FluentResource>,
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl Localizer {
    /// Build the localizer for `locale`
    pub fn new(locale: Locale) -> I18nResult<Self> {
        let lang_id = locale.to_language_identifier()?;

        let resource = FluentResource::try_new(locale.source().to_string()).map_err(|(_, errors)| {
            I18nError::FluentParseError {
                locale: locale.code().to_string(),
                errors: errors.into_iter().map(|e| format!("{e:?}")).collect(),
            }
        })?;

        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| I18nError::FluentParseError {
                locale: locale.code().to_string(),
                errors: errors.into_iter().map(|e| format!("{e:?}")).collect(),
            })?;

        debug!(%locale, "Loaded Fluent bundle");
        Ok(Self { locale, bundle })
    }

    /// Build the localizer for a language tag such as `pt-BR`
    pub fn for_language(tag: &str) -> I18nResult<Self> {
        Self::new(Locale::from_code(tag)?)
    }

    /// The active locale
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Check if a message exists in the bundle
    pub fn has_message(&self, id: &str) -> bool {
        self.bundle.has_message(id)
    }

    /// Format a message with string arguments
    pub fn format(&self, id: &str, args: &[(&str, String)]) -> I18nResult<String> {
        let message = self
            .bundle
            .get_message(id)
            .ok_or_else(|| I18nError::MessageNotFound { key: id.to_string() })?;
        let pattern = message
            .value()
            .ok_or_else(|| I18nError::MessageNotFound { key: id.to_string() })?;

        let fluent_args = (!args.is_empty()).then(|| {
            let mut fluent_args = FluentArgs::new();
            for (key, value) in args {
                fluent_args.set(*key, FluentValue::from(value.as_str()));
            }
            fluent_args
        });

        let mut errors = Vec::new();
        let formatted = self
            .bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors);

        if !errors.is_empty() {
            return Err(I18nError::MessageFormatError {
                key: id.to_string(),
                errors: errors.into_iter().map(|e| format!("{e:?}")).collect(),
            });
        }
        Ok(formatted.into_owned())
    }

    /// Format a message without arguments, falling back to its id
    pub fn text(&self, id: &str) -> String {
        self.text_with(id, &[])
    }

    /// Format a message, falling back to its id
    pub fn text_with(&self, id: &str, args: &[(&str, String)]) -> String {
        self.format(id, args).unwrap_or_else(|e| {
            warn!(locale = %self.locale, error = %e, "Falling back to message id");
            id.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ids;

    #[test]
    fn test_format_without_args() {
        let localizer = Localizer::new(Locale::English).unwrap();
        assert_eq!(localizer.text(ids::SUMMARY_TITLE), "Executive summary");
    }

    #[test]
    fn test_format_with_args_has_no_isolation_marks() {
        let localizer = Localizer::new(Locale::Portuguese).unwrap();
        let text = localizer
            .format(ids::SUMMARY_TOTAL, &[("count", "42".to_string())])
            .unwrap();
        assert_eq!(text, "Usuários únicos: 42");
    }

    #[test]
    fn test_missing_message() {
        let localizer = Localizer::new(Locale::English).unwrap();
        assert!(matches!(
            localizer.format("no-such-message", &[]),
            Err(I18nError::MessageNotFound { .. })
        ));
        assert_eq!(localizer.text("no-such-message"), "no-such-message");
    }

    #[test]
    fn test_missing_argument_is_format_error() {
        let localizer = Localizer::new(Locale::English).unwrap();
        assert!(matches!(
            localizer.format(ids::SUMMARY_TOTAL, &[]),
            Err(I18nError::MessageFormatError { .. })
        ));
    }

    #[test]
    fn test_for_language() {
        assert_eq!(Localizer::for_language("pt-BR").unwrap().locale(), Locale::Portuguese);
        assert!(Localizer::for_language("de-DE").is_err());
    }
}
