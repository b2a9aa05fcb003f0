use crate::commands::AppState;
use crate::models::{Language, Settings, Theme};
use rust_i18n::t;

pub fn get_settings(state: &AppState) -> Settings {
    state.settings.settings()
}

/// 未知主题直接拒绝，不修改设置
pub fn set_theme(state: &AppState, value: &str) -> Result<Settings, String> {
    let theme: Theme = value.parse().map_err(|_| {
        t!("settings.errors.unknown_theme", locale = state.locale(), value = value).to_string()
    })?;
    state
        .settings
        .set_theme(theme)
        .map_err(|e| format!("{}: {:#}", t!("common.errors.storage", locale = state.locale()), e))
}

/// 未知语言直接拒绝，不修改设置
pub fn set_language(state: &AppState, value: &str) -> Result<Settings, String> {
    let language: Language = value.parse().map_err(|_| {
        t!("settings.errors.unknown_language", locale = state.locale(), value = value).to_string()
    })?;
    state
        .settings
        .set_language(language)
        .map_err(|e| format!("{}: {:#}", t!("common.errors.storage", locale = language.code()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::services::settings::SETTINGS_NAMESPACE;
    use tempfile::tempdir;

    #[test]
    fn unknown_values_are_rejected_without_mutation() {
        let dir = tempdir().unwrap();
        let config = ClientConfig::new("http://127.0.0.1:9", dir.path().to_path_buf());
        let state = AppState::initialize(config, true).unwrap();
        let before = get_settings(&state);

        assert!(set_theme(&state, "neon").is_err());
        assert!(set_language(&state, "de").is_err());
        assert_eq!(get_settings(&state), before);
        assert!(!dir.path().join(format!("{}.json", SETTINGS_NAMESPACE)).exists());

        let updated = set_theme(&state, "system").unwrap();
        assert_eq!(updated.theme, Theme::System);
        assert_eq!(updated.language, before.language);
    }
}
