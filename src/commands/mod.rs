pub mod auth;
pub mod scans;
pub mod settings;

use crate::config::ClientConfig;
use crate::router::{Navigator, Route};
use crate::services::{
    ApiClient, AuthService, BlobStorage, MockBackend, ScanBackend, ScanService, SessionStore,
    SettingsStore,
};
use anyhow::{Context, Result};
use rust_i18n::t;
use std::sync::Arc;
use std::time::Duration;

pub use auth::{current_user, login, logout, register};
pub use scans::{
    create_scan, delete_scan, export_scan_report, get_dashboard, get_scan, get_scan_report,
    get_user_statistics, restart_scan, watch_scan, Dashboard,
};
pub use settings::{get_settings, set_language, set_theme};

/// 离线模式下模拟的网络延迟
const OFFLINE_LATENCY: Duration = Duration::from_millis(300);

/// 全局应用状态，由入口创建后以引用传给各命令
pub struct AppState {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub settings: Arc<SettingsStore>,
    pub navigator: Arc<Navigator>,
    pub api: Arc<ApiClient>,
    pub auth: AuthService,
    pub scans: Arc<ScanBackend>,
}

impl AppState {
    /// 创建存储、恢复会话与设置、初始化请求管线
    pub fn initialize(config: ClientConfig, offline: bool) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;
        let storage = BlobStorage::new(config.data_dir.clone());

        let session = Arc::new(SessionStore::new(storage.clone()));
        session.load_from_storage();

        let settings = Arc::new(SettingsStore::new(storage));
        settings.load_from_storage();

        let navigator = Arc::new(Navigator::new());
        let api = Arc::new(
            ApiClient::new(&config, Arc::clone(&session), Arc::clone(&navigator))
                .context("Failed to build HTTP client")?,
        );

        let scans = if offline {
            log::info!("Running against the offline demo backend");
            ScanBackend::Offline(MockBackend::seeded().with_latency(OFFLINE_LATENCY))
        } else {
            ScanBackend::Remote(ScanService::new(Arc::clone(&api)))
        };

        Ok(Self {
            auth: AuthService::new(Arc::clone(&api)),
            scans: Arc::new(scans),
            config,
            session,
            settings,
            navigator,
            api,
        })
    }

    pub fn locale(&self) -> &'static str {
        self.settings.locale()
    }

    /// 进入页面前的路由守卫；离线模式不需要登录
    pub fn guard(&self, path: &str) -> Result<Route, String> {
        if self.scans.is_offline() {
            return Ok(Route::parse(path).unwrap_or(Route::Landing));
        }

        let route = self.navigator.navigate(path, self.session.is_authenticated());
        if route == Route::Login && Route::parse(path).map_or(false, |r| r.is_protected()) {
            return Err(t!("auth.errors.login_required", locale = self.locale()).to_string());
        }
        Ok(route)
    }
}

/// 解析路径并按登录状态决定最终页面
pub fn open_route(state: &AppState, path: &str) -> Route {
    state
        .navigator
        .navigate(path, state.scans.is_offline() || state.session.is_authenticated())
}
