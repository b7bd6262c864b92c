use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Language used when the user's Telegram language is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "es";

const RESOURCES: [(&str, &str); 2] = [
    ("es", include_str!("../locales/es/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the Grid Guru bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl std::fmt::Debug for LocalizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationManager")
            .field("languages", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocalizationManager {
    /// Create a new localization manager with every embedded locale loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (locale_str, source) in RESOURCES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: &LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        // Shared across handler tasks, so the memoizer must be thread-safe
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the Unicode isolation marks literally
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid {} resource: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {} messages: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self.bundles.get(language) {
            Some(bundle) => bundle,
            None => match self.bundles.get(DEFAULT_LANGUAGE) {
                Some(bundle) => bundle,
                None => return format!("Missing translation: {}", key),
            },
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();
        let mut errors = vec![];

        if let Some(args) = args {
            let fluent_args = FluentArgs::from_iter(
                args.iter().map(|(k, v)| (*k, FluentValue::from(*v))),
            );
            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut errors);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut errors);
        }

        value
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }
}

/// Create a shared localization manager
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Get a localized message in the user's language
pub fn t_lang(manager: &LocalizationManager, key: &str, language_code: Option<&str>) -> String {
    let language = detect_language(manager, language_code);
    manager.get_message_in_language(key, &language, None)
}

/// Get a localized message with arguments in the user's language
pub fn t_args_lang(
    manager: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language_code: Option<&str>,
) -> String {
    let language = detect_language(manager, language_code);
    manager.get_message_with_args_in_language(key, &language, args)
}

/// Detect the appropriate language based on user's Telegram language code
pub fn detect_language(manager: &LocalizationManager, language_code: Option<&str>) -> String {
    if let Some(code) = language_code {
        // "en-US" -> "en"
        let lang = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
        if manager.is_language_supported(&lang) {
            return lang;
        }
    }

    DEFAULT_LANGUAGE.to_string()
}
