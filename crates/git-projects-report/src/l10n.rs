//! Localization support using Project Fluent.
//!
//! User-facing status lines of the CLI are looked up here. Translations live
//! in `locales/<lang>/main.ftl` and are embedded at compile time.
//!
//! # Supported Locales
//!
//! - English (en) - Default fallback
//! - German (de)
//!
//! # Example
//!
//! ```
//! use git_projects_report::l10n::Localizer;
//!
//! let localizer = Localizer::new("en").unwrap();
//! let message = localizer.get_count("scan-complete", 42, None);
//! assert_eq!(message, "Found 42 repositories");
//! ```

use crate::error::{Error, Result};
use fluent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// The default locale used when no locale is specified or loading fails.
pub const DEFAULT_LOCALE: &str = "en";

const EMBEDDED_LOCALES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("de", include_str!("../locales/de/main.ftl")),
];

/// Loaded translations for one locale.
pub struct Localizer {
    bundle: FluentBundle<FluentResource>,
    locale: LanguageIdentifier,
}

impl Localizer {
    /// Creates a Localizer for `locale_str`.
    ///
    /// Region subtags are ignored (`de-AT` uses the German bundle). Unknown
    /// and unparsable locales fall back to English.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded English bundle cannot be loaded.
    pub fn new(locale_str: &str) -> Result<Self> {
        let requested = locale_str
            .parse::<LanguageIdentifier>()
            .ok()
            .filter(|id| embedded_locale(id.language.as_str()).is_some());

        let locale = match requested {
            Some(id) => id,
            None => DEFAULT_LOCALE
                .parse()
                .map_err(|_| Error::l10n("Invalid default locale"))?,
        };

        let bundle = Self::load_locale(&locale)?;
        Ok(Self { bundle, locale })
    }

    /// Creates a Localizer from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn from_system() -> Result<Self> {
        Self::new(&detect_system_locale())
    }

    fn load_locale(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let language = locale.language.as_str();
        let ftl = embedded_locale(language)
            .ok_or_else(|| Error::l10n(format!("No translations for '{}'", language)))?;

        let resource = FluentResource::try_new(ftl.to_string())
            .map_err(|(_, errors)| Error::l10n(format!("Failed to parse FTL: {:?}", errors)))?;

        let mut bundle = FluentBundle::new(vec![locale.clone()]);
        // Messages go to a terminal, not into bidirectional text.
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|e| Error::l10n(format!("Failed to add resource: {:?}", e)))?;

        Ok(bundle)
    }

    /// Retrieves a translated message by its identifier.
    ///
    /// Returns `[msg_id]` if the message does not exist.
    pub fn get(&self, msg_id: &str, args: Option<&[(&str, &str)]>) -> String {
        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (key, value) in args {
                fluent_args.set(*key, value.to_string());
            }
            fluent_args
        });
        self.format(msg_id, fluent_args.as_ref())
    }

    /// Like [`get`](Self::get), with a numeric `$count` for plural selection.
    pub fn get_count(&self, msg_id: &str, count: usize, args: Option<&[(&str, &str)]>) -> String {
        let mut fluent_args = FluentArgs::new();
        fluent_args.set("count", FluentValue::from(count));
        for (key, value) in args.unwrap_or_default() {
            fluent_args.set(*key, value.to_string());
        }
        self.format(msg_id, Some(&fluent_args))
    }

    fn format(&self, msg_id: &str, args: Option<&FluentArgs>) -> String {
        let Some(pattern) = self.bundle.get_message(msg_id).and_then(|m| m.value()) else {
            return format!("[{}]", msg_id);
        };

        let mut errors = vec![];
        let formatted = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(message = msg_id, ?errors, "fluent formatting errors");
        }
        formatted.into_owned()
    }

    /// Gets the current locale identifier.
    pub fn locale(&self) -> String {
        self.locale.to_string()
    }
}

fn embedded_locale(language: &str) -> Option<&'static str> {
    EMBEDDED_LOCALES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, ftl)| *ftl)
}

/// Detects the language code from `LC_ALL`, `LC_MESSAGES` or `LANG`.
///
/// With `LANG=de_DE.UTF-8`, this returns `"de"`. Empty variables are
/// skipped; the fallback is `"en"`.
pub fn detect_system_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|locale| {
            locale
                .split(['_', '.'])
                .next()
                .map(|s| s.to_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}
