use crate::models::{Appearance, Language, Settings, Theme};
use crate::services::storage::BlobStorage;
use anyhow::Result;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 设置在本地存储中的命名空间
pub const SETTINGS_NAMESPACE: &str = "securecheck-settings";

/// 主题与语言偏好，与登录身份无关
pub struct SettingsStore {
    state: Mutex<Settings>,
    storage: BlobStorage,
}

impl SettingsStore {
    pub fn new(storage: BlobStorage) -> Self {
        Self {
            state: Mutex::new(Settings::default()),
            storage,
        }
    }

    fn state(&self) -> MutexGuard<'_, Settings> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 启动时读取一次；缺失或损坏时使用默认值
    pub fn load_from_storage(&self) -> Settings {
        let settings = match self.storage.load::<Settings>(SETTINGS_NAMESPACE) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable settings file: {:#}", e);
                Settings::default()
            }
        };

        *self.state() = settings;
        crate::i18n::apply_language(settings.language);
        settings
    }

    pub fn settings(&self) -> Settings {
        *self.state()
    }

    pub fn language(&self) -> Language {
        self.state().language
    }

    pub fn locale(&self) -> &'static str {
        self.language().code()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<Settings> {
        let settings = {
            let mut state = self.state();
            state.theme = theme;
            *state
        };
        log::info!("Theme set to {}", theme.as_str());
        self.storage.save(SETTINGS_NAMESPACE, &settings)?;
        Ok(settings)
    }

    pub fn set_language(&self, language: Language) -> Result<Settings> {
        let settings = {
            let mut state = self.state();
            state.language = language;
            *state
        };
        crate::i18n::apply_language(language);
        log::info!("Language set to {}", language.code());
        self.storage.save(SETTINGS_NAMESPACE, &settings)?;
        Ok(settings)
    }

    /// 当前主题对应的实际外观
    pub fn appearance(&self) -> Appearance {
        self.state().theme.resolve(system_prefers_dark())
    }
}

/// 终端通过 `COLORFGBG`（形如 `15;0`）报告前景/背景色，背景色为暗色时视为深色模式
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .and_then(background_is_dark)
        .unwrap_or(false)
}

fn background_is_dark(colorfgbg: &str) -> Option<bool> {
    let bg: u8 = colorfgbg.rsplit(';').next()?.trim().parse().ok()?;
    Some(matches!(bg, 0..=6 | 8))
}
