use crate::commands::AppState;
use crate::error::ApiError;
use crate::models::{
    ExportFormat, ListScansQuery, Scan, ScanFilter, ScanReport, ScanStats, ScanType,
    UserStatistics,
};
use crate::services::{PollHandle, ScanPoller};
use std::sync::Arc;

/// 仪表盘数据：全部扫描的统计 + 筛选后的列表
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub stats: ScanStats,
    pub scans: Vec<Scan>,
}

pub async fn get_dashboard(state: &AppState, filter: &ScanFilter) -> Result<Dashboard, String> {
    state.guard("/dashboard")?;

    let scans = state
        .scans
        .list(&ListScansQuery::default())
        .await
        .map_err(|e| e.notification(state.locale()))?;

    Ok(Dashboard {
        stats: ScanStats::from_scans(&scans),
        scans: filter.apply(&scans).into_iter().cloned().collect(),
    })
}

/// 新建扫描；URL 校验失败时不会发出请求
pub async fn create_scan(
    state: &AppState,
    target_url: &str,
    scan_type: ScanType,
) -> Result<Scan, String> {
    state.guard("/dashboard")?;
    state
        .scans
        .create(target_url, scan_type)
        .await
        .map_err(|e| e.notification(state.locale()))
}

/// 未找到时返回 `Ok(None)`，由界面显示“未找到”而不是错误提示
pub async fn get_scan(state: &AppState, id: i64) -> Result<Option<Scan>, String> {
    state.guard(&format!("/scans/{}", id))?;
    match state.scans.get(id).await {
        Ok(scan) => Ok(Some(scan)),
        Err(ApiError::NotFound) => Ok(None),
        Err(e) => Err(e.notification(state.locale())),
    }
}

pub async fn delete_scan(state: &AppState, id: i64) -> Result<(), String> {
    state.guard("/dashboard")?;
    state
        .scans
        .delete(id)
        .await
        .map_err(|e| e.notification(state.locale()))
}

pub async fn restart_scan(state: &AppState, id: i64) -> Result<Scan, String> {
    state.guard(&format!("/scans/{}", id))?;
    state
        .scans
        .restart(id)
        .await
        .map_err(|e| e.notification(state.locale()))
}

/// 打开扫描详情并开始轮询；返回的句柄被 drop 时轮询停止
pub fn watch_scan(state: &AppState, id: i64) -> Result<PollHandle, String> {
    state.guard(&format!("/scans/{}", id))?;
    Ok(ScanPoller::spawn(
        Arc::clone(&state.scans),
        id,
        state.config.poll_interval,
    ))
}

pub async fn get_scan_report(state: &AppState, id: i64) -> Result<ScanReport, String> {
    state.guard(&format!("/scans/{}", id))?;
    state
        .scans
        .report(id)
        .await
        .map_err(|e| e.notification(state.locale()))
}

pub async fn export_scan_report(
    state: &AppState,
    id: i64,
    format: ExportFormat,
) -> Result<String, String> {
    state.guard(&format!("/scans/{}", id))?;
    state
        .scans
        .export(id, format)
        .await
        .map_err(|e| e.notification(state.locale()))
}

pub async fn get_user_statistics(state: &AppState) -> Result<UserStatistics, String> {
    state.guard("/dashboard")?;
    state
        .scans
        .user_statistics()
        .await
        .map_err(|e| e.notification(state.locale()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::services::PollState;
    use tempfile::{tempdir, TempDir};

    fn offline_state() -> (TempDir, AppState) {
        let dir = tempdir().unwrap();
        let config = ClientConfig::new("http://127.0.0.1:9", dir.path().to_path_buf());
        let state = AppState::initialize(config, true).unwrap();
        (dir, state)
    }

    #[tokio::test(start_paused = true)]
    async fn dashboard_counts_seeded_scans() {
        let (_dir, state) = offline_state();
        let dashboard = get_dashboard(&state, &ScanFilter::default()).await.unwrap();
        assert_eq!(dashboard.stats, ScanStats { total: 4, completed: 1, pending: 2, failed: 1 });
        assert_eq!(dashboard.scans.len(), 4);

        let filter = ScanFilter { status: Some(crate::models::ScanStatus::Pending), search: None };
        let dashboard = get_dashboard(&state, &filter).await.unwrap();
        assert_eq!(dashboard.stats.total, 4);
        assert_eq!(dashboard.scans.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_url_produces_a_notification() {
        let (_dir, state) = offline_state();
        let message = create_scan(&state, "not a url", ScanType::Full).await.unwrap_err();
        assert!(!message.is_empty());
        assert_eq!(get_dashboard(&state, &ScanFilter::default()).await.unwrap().stats.total, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_scan_is_an_inline_state() {
        let (_dir, state) = offline_state();
        assert_eq!(get_scan(&state, 77).await.unwrap(), None);
        assert!(get_scan(&state, 1).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn watching_a_new_scan_ends_when_completed() {
        let (_dir, state) = offline_state();
        let scan = create_scan(&state, "https://example.org", ScanType::Headers).await.unwrap();

        let mut handle = watch_scan(&state, scan.id).unwrap();
        let snapshot = handle.settled().await;
        match snapshot.state {
            PollState::Finished(done) => {
                assert_eq!(done.id, scan.id);
                assert!(done.completed_at.is_some());
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_need_the_remote_service() {
        let (_dir, state) = offline_state();
        assert!(get_scan_report(&state, 1).await.is_err());
    }
}
