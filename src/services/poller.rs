use crate::error::ApiError;
use crate::models::Scan;
use crate::services::scans::ScanSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 轮询中的扫描在界面上的状态
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Loading,
    /// 仍在 pending / running，会继续轮询
    Tracking(Scan),
    /// 已到达终态，轮询结束
    Finished(Scan),
    NotFound,
    /// 会话失效，由请求管线负责跳转登录
    Unauthorized,
    /// 不可重试的错误，或首次获取就失败；轮询结束
    Failed(String),
}

impl PollState {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            PollState::Finished(_)
                | PollState::NotFound
                | PollState::Unauthorized
                | PollState::Failed(_)
        )
    }

    pub fn scan(&self) -> Option<&Scan> {
        match self {
            PollState::Tracking(scan) | PollState::Finished(scan) => Some(scan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub state: PollState,
    /// 最近一次临时失败；成功获取后清空
    pub last_error: Option<String>,
    pub fetches: u32,
}

impl Default for PollSnapshot {
    fn default() -> Self {
        Self {
            state: PollState::Loading,
            last_error: None,
            fetches: 0,
        }
    }
}

/// 轮询任务句柄。取消或 drop 后不会再发起请求，迟到的响应也会被丢弃
pub struct PollHandle {
    rx: watch::Receiver<PollSnapshot>,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn snapshot(&self) -> PollSnapshot {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.rx.clone()
    }

    /// 等待下一次状态更新；任务已结束时返回 `false`
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// 等待轮询结束（终态、未找到或会话失效）
    pub async fn settled(&mut self) -> PollSnapshot {
        loop {
            let snapshot = self.snapshot();
            if snapshot.state.is_settled() || !self.changed().await {
                return self.snapshot();
            }
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            log::debug!("Scan poller cancelled");
        }
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct ScanPoller;

impl ScanPoller {
    /// 立即获取一次；非终态时每隔 `interval` 再获取，请求严格串行
    pub fn spawn<S: ScanSource>(source: Arc<S>, scan_id: i64, interval: Duration) -> PollHandle {
        let (tx, rx) = watch::channel(PollSnapshot::default());
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(poll_loop(
            source,
            scan_id,
            interval,
            tx,
            Arc::clone(&cancelled),
        ));

        PollHandle { rx, cancelled, task }
    }
}

async fn poll_loop<S: ScanSource>(
    source: Arc<S>,
    scan_id: i64,
    interval: Duration,
    tx: watch::Sender<PollSnapshot>,
    cancelled: Arc<AtomicBool>,
) {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }

        let result = source.fetch_scan(scan_id).await;

        if cancelled.load(Ordering::SeqCst) || tx.is_closed() {
            log::debug!("Discarding stale response for scan {}", scan_id);
            return;
        }

        let mut settled = false;
        tx.send_modify(|snapshot| {
            snapshot.fetches += 1;
            match result {
                Ok(scan) => {
                    snapshot.last_error = None;
                    snapshot.state = if scan.is_terminal() {
                        log::info!("Scan {} reached {}", scan.id, scan.status.as_str());
                        PollState::Finished(scan)
                    } else {
                        PollState::Tracking(scan)
                    };
                }
                Err(ApiError::NotFound) => {
                    log::warn!("Scan {} not found; polling stopped", scan_id);
                    snapshot.state = PollState::NotFound;
                }
                Err(ApiError::Unauthorized { .. }) => {
                    snapshot.state = PollState::Unauthorized;
                }
                Err(e) if !e.is_retryable() || snapshot.state == PollState::Loading => {
                    log::warn!("Polling scan {} stopped: {}", scan_id, e);
                    snapshot.last_error = Some(e.to_string());
                    snapshot.state = PollState::Failed(e.to_string());
                }
                Err(e) => {
                    // 只根据最近一次成功获取到的状态判断是否结束
                    log::warn!("Polling scan {} failed: {}", scan_id, e);
                    snapshot.last_error = Some(e.to_string());
                }
            }
            settled = snapshot.state.is_settled();
        });

        if settled {
            return;
        }

        tokio::time::sleep(interval).await;
    }
}
