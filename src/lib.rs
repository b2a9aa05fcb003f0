pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod render;
pub mod router;
pub mod services;

rust_i18n::i18n!("locales", fallback = "es");

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, ScanCommand, SettingsCommand};
use commands::AppState;
use models::{ScanFilter, ScanStatus};
use render::Palette;
use router::Route;
use rust_i18n::t;
use services::{ActivityFeed, PollState};
use std::path::PathBuf;

/// 命令失败时返回给入口的错误，内容已经本地化
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Notification(pub String);

pub async fn run() -> Result<()> {
    let args = Args::parse();

    // 初始化日志；--verbose 时默认输出 debug
    let default_filter = if args.verbose { "securecheck=debug" } else { "securecheck=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if args.no_color {
        yansi::disable();
    }

    rust_i18n::set_locale(i18n::DEFAULT_LOCALE);
    let config = args.client_config()?;
    log::debug!("API base: {}, data dir: {:?}", config.api_base(), config.data_dir);
    let state = AppState::initialize(config, args.offline)?;

    let result = dispatch(&state, args.command).await;

    if session_was_expired(&state) {
        render::info(&t!("auth.errors.session_expired", locale = state.locale()));
    }

    result.map_err(|message| Notification(message).into())
}

async fn dispatch(state: &AppState, command: Command) -> Result<(), String> {
    let locale = state.locale();
    let palette = Palette::for_appearance(state.settings.appearance());

    match command {
        Command::Register { email, password, full_name } => {
            let user = commands::register(state, &email, &password, &full_name).await?;
            render::success(&t!("auth.register.success", locale = locale, name = user.display_name()));
        }
        Command::Login { email, password } => {
            let user = commands::login(state, &email, &password).await?;
            render::success(&t!("auth.login.success", locale = locale, name = user.display_name()));
        }
        Command::Logout => {
            let route = commands::logout(state);
            render::success(&t!("auth.logout.success", locale = locale));
            render::route(route, locale);
        }
        Command::Whoami => {
            let user = commands::current_user(state).await?;
            println!("{} <{}>", user.display_name(), user.email);
        }
        Command::Open { path } => {
            let route = commands::open_route(state, &path);
            render::route(route, locale);
        }
        Command::Dashboard { status, search } => {
            let status = parse_status_filter(&status, locale)?;
            let dashboard = commands::get_dashboard(state, &ScanFilter { status, search }).await?;
            render::dashboard(&dashboard, locale, palette);
        }
        Command::Scan(command) => scan_command(state, command, palette).await?,
        Command::Stats => {
            let stats = commands::get_user_statistics(state).await?;
            render::statistics(&stats, locale, palette);
        }
        Command::Settings(command) => {
            let settings = match command {
                SettingsCommand::Show => commands::get_settings(state),
                SettingsCommand::Theme { value } => {
                    let settings = commands::set_theme(state, &value)?;
                    render::success(&t!("settings.saved", locale = state.locale()));
                    settings
                }
                SettingsCommand::Language { value } => {
                    let settings = commands::set_language(state, &value)?;
                    render::success(&t!("settings.saved", locale = state.locale()));
                    settings
                }
            };
            render::settings(&settings, state.settings.appearance(), state.locale());
        }
    }

    Ok(())
}

async fn scan_command(state: &AppState, command: ScanCommand, palette: Palette) -> Result<(), String> {
    let locale = state.locale();

    match command {
        ScanCommand::New { target_url, scan_type } => {
            let scan = commands::create_scan(state, &target_url, scan_type).await?;
            render::success(&t!("scan.created", locale = locale, id = scan.id));
            render::scan_details(&scan, locale, palette);
        }
        ScanCommand::Show { id, watch: false } => match commands::get_scan(state, id).await? {
            Some(scan) => {
                render::scan_details(&scan, locale, palette);
                let feed = ActivityFeed::new(locale);
                render::activity(&feed.render(&scan), palette);
            }
            None => return Err(t!("scan.not_found", locale = locale).to_string()),
        },
        ScanCommand::Show { id, watch: true } => watch(state, id, palette).await?,
        ScanCommand::Delete { id } => {
            commands::delete_scan(state, id).await?;
            render::success(&t!("scan.deleted", locale = locale, id = id));
        }
        ScanCommand::Restart { id } => {
            let scan = commands::restart_scan(state, id).await?;
            render::success(&t!("scan.restarted", locale = locale, id = scan.id));
            render::scan_details(&scan, locale, palette);
        }
        ScanCommand::Report { id } => {
            let report = commands::get_scan_report(state, id).await?;
            render::report(&report, locale, palette);
        }
        ScanCommand::Export { id, format, output } => {
            let body = commands::export_scan_report(state, id, format).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(format.default_file_name(id)));
            write_export(&path, &body).map_err(|e| {
                format!("{}: {:#}", t!("common.errors.storage", locale = locale), e)
            })?;
            render::success(&t!("scan.exported", locale = locale, path = path.display()));
        }
    }

    Ok(())
}

/// 持续刷新扫描详情，直到终态、未找到或 Ctrl+C
async fn watch(state: &AppState, id: i64, palette: Palette) -> Result<(), String> {
    let locale = state.locale();
    let handle = commands::watch_scan(state, id)?;
    let mut updates = handle.subscribe();
    let mut feed = ActivityFeed::new(locale);
    let mut ticker = tokio::time::interval(services::activity::TICK);
    let mut last_status: Option<ScanStatus> = None;

    loop {
        tokio::select! {
            alive = updates.changed() => {
                let snapshot = handle.snapshot();
                if let Some(error) = &snapshot.last_error {
                    log::warn!("{}", error);
                }
                match &snapshot.state {
                    PollState::Loading => {}
                    PollState::Tracking(scan) => {
                        if last_status != Some(scan.status) {
                            last_status = Some(scan.status);
                            render::scan_details(scan, locale, palette);
                            if scan.status == ScanStatus::Pending {
                                render::activity(&feed.render(scan), palette);
                            }
                        }
                    }
                    PollState::Finished(scan) => {
                        println!();
                        render::scan_details(scan, locale, palette);
                        render::activity(&feed.render(scan), palette);
                        return Ok(());
                    }
                    PollState::NotFound => {
                        return Err(t!("scan.not_found", locale = locale).to_string());
                    }
                    PollState::Unauthorized => {
                        return Err(t!("auth.errors.login_required", locale = locale).to_string());
                    }
                    PollState::Failed(reason) => {
                        return Err(format!("{}: {}", t!("common.errors.generic", locale = locale), reason));
                    }
                }
                if alive.is_err() {
                    return Ok(());
                }
            }
            _ = ticker.tick() => {
                if last_status == Some(ScanStatus::Running) {
                    let line = feed.tick(chrono::Local::now()).to_string();
                    render::activity(&[line], palette);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                render::info(&t!("scan.watch_stopped", locale = locale));
                return Ok(());
            }
        }
    }
}

/// 只有请求管线因 401 强制跳回登录页时才提示会话过期；未登录访问受保护页面不算
fn session_was_expired(state: &AppState) -> bool {
    state.navigator.forced_redirects().contains(&Route::Login) && !state.session.is_authenticated()
}

fn parse_status_filter(value: &str, locale: &str) -> Result<Option<ScanStatus>, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value
        .parse::<ScanStatus>()
        .map(Some)
        .map_err(|_| t!("dashboard.errors.unknown_status", locale = locale, value = value).to_string())
}

fn write_export(path: &std::path::Path, body: &str) -> Result<()> {
    std::fs::write(path, body).with_context(|| format!("Failed to write {:?}", path))
}
