use crate::models::Language;

pub const DEFAULT_LOCALE: &str = "es";

/// 切换全局翻译表
pub fn apply_language(language: Language) {
    rust_i18n::set_locale(language.code());
    log::debug!("Locale switched to {}", language.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locale_matches_default_language() {
        assert_eq!(DEFAULT_LOCALE, crate::models::Settings::default().language.code());
    }

    #[test]
    fn both_tables_are_loaded() {
        let es = rust_i18n::t!("dashboard.title", locale = "es");
        let en = rust_i18n::t!("dashboard.title", locale = "en");
        assert_ne!(es, en);
        assert!(!en.contains("dashboard.title"));
    }
}
