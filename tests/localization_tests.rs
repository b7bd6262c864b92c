//! # Localization Tests
//!
//! Message lookup, argument substitution and language detection for the
//! embedded Fluent bundles.

use grid_guru_bot::localization::{
    create_localization_manager, detect_language, t_args_lang, t_lang, LocalizationManager,
    DEFAULT_LANGUAGE,
};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> Arc<LocalizationManager> {
        create_localization_manager().expect("Failed to create localization manager")
    }

    #[test]
    fn test_spanish_is_default() {
        let manager = setup_localization();

        assert_eq!(DEFAULT_LANGUAGE, "es");
        assert_eq!(detect_language(&manager, None), "es");
        assert_eq!(detect_language(&manager, Some("de-DE")), "es");
    }

    #[test]
    fn test_detect_language_uses_prefix() {
        let manager = setup_localization();

        assert_eq!(detect_language(&manager, Some("en-US")), "en");
        assert_eq!(detect_language(&manager, Some("en_GB")), "en");
        assert_eq!(detect_language(&manager, Some("ES")), "es");
    }

    #[test]
    fn test_arguments_are_substituted_without_isolation_marks() {
        let manager = setup_localization();

        let message = t_args_lang(&manager, "welcome-title", &[("name", "Ana")], Some("es"));
        assert_eq!(message, "🎉👋 ¡Bienvenido Ana!");
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_get_message_in_language_with_map() {
        let manager = setup_localization();
        let mut args = HashMap::new();
        args.insert("url", "https://t.me/example");

        let message = manager.get_message_in_language("contact-body", "en", Some(&args));
        assert!(message.ends_with("https://t.me/example"));
    }

    #[test]
    fn test_missing_key() {
        let manager = setup_localization();

        assert_eq!(
            t_lang(&manager, "no-such-key", Some("es")),
            "Missing translation: no-such-key"
        );
    }

    #[test]
    fn test_unsupported_language_falls_back() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("coming-soon", "fr", None);
        assert_eq!(message, "🚧 Próximamente... Estamos trabajando en nuevas funciones.");
    }

    #[test]
    fn test_both_bundles_define_the_same_keys() {
        let manager = setup_localization();
        let keys = [
            "processing",
            "coming-soon",
            "unrecognized-title",
            "empty-drivers",
            "error-qualifying",
            "label-countdown",
            "button-main-menu",
            "trivia-wrong",
            "help-footer",
        ];

        for lang in ["es", "en"] {
            for key in keys {
                let message = manager.get_message_in_language(key, lang, None);
                assert!(
                    !message.starts_with("Missing"),
                    "{} is missing from {}",
                    key,
                    lang
                );
            }
        }
    }
}
