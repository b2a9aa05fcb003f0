//! 离线演示用的内存扫描后端，数据与状态推进节奏模拟真实服务。

use crate::error::ApiError;
use crate::models::{Scan, ScanStatus, ScanType, Severity, Vulnerability};
use crate::services::scans::{validate_target_url, ScanSource};
use chrono::{Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// 四条示例扫描：completed、running、pending、failed
pub fn seeded_scans() -> Vec<Scan> {
    let now = Utc::now();
    vec![
        Scan {
            id: 1,
            user_id: None,
            target_url: "https://example.com".to_string(),
            scan_type: ScanType::Full,
            status: ScanStatus::Completed,
            created_at: now,
            completed_at: Some(now),
            vulnerabilities: vec![
                Vulnerability {
                    id: None,
                    scan_id: Some(1),
                    severity: Severity::Medium,
                    title: "Missing X-Frame-Options header".to_string(),
                    description: "The site may be vulnerable to clickjacking".to_string(),
                    recommendation: Some("Add the header X-Frame-Options: DENY".to_string()),
                    created_at: None,
                },
                Vulnerability {
                    id: None,
                    scan_id: Some(1),
                    severity: Severity::Low,
                    title: "SSL certificate expires soon".to_string(),
                    description: "The SSL certificate expires in 30 days".to_string(),
                    recommendation: Some("Renew the SSL certificate".to_string()),
                    created_at: None,
                },
            ],
            vulnerability_count: None,
        },
        Scan {
            id: 2,
            user_id: None,
            target_url: "https://github.com".to_string(),
            scan_type: ScanType::Ssl,
            status: ScanStatus::Running,
            created_at: now - ChronoDuration::minutes(5),
            completed_at: None,
            vulnerabilities: vec![],
            vulnerability_count: None,
        },
        Scan {
            id: 3,
            user_id: None,
            target_url: "https://google.com".to_string(),
            scan_type: ScanType::Headers,
            status: ScanStatus::Pending,
            created_at: now - ChronoDuration::minutes(10),
            completed_at: None,
            vulnerabilities: vec![],
            vulnerability_count: None,
        },
        Scan {
            id: 4,
            user_id: None,
            target_url: "https://test-site.com".to_string(),
            scan_type: ScanType::Full,
            status: ScanStatus::Failed,
            created_at: now - ChronoDuration::minutes(15),
            completed_at: Some(now - ChronoDuration::seconds(850)),
            vulnerabilities: vec![],
            vulnerability_count: None,
        },
    ]
}

/// 尚未发生的状态变更
#[derive(Debug, Clone, Copy)]
struct Transition {
    at: Instant,
    status: ScanStatus,
}

#[derive(Debug)]
struct MockScan {
    scan: Scan,
    pending: Vec<Transition>,
}

impl MockScan {
    fn advance(&mut self, now: Instant) {
        while let Some(next) = self.pending.first().copied() {
            if next.at > now {
                break;
            }
            self.pending.remove(0);
            self.scan.status = next.status;
            if next.status.is_terminal() {
                self.scan.completed_at = Some(Utc::now());
            }
            if next.status == ScanStatus::Completed && self.scan.vulnerabilities.is_empty() {
                self.scan.vulnerabilities.push(Vulnerability {
                    id: None,
                    scan_id: Some(self.scan.id),
                    severity: Severity::Low,
                    title: "Test vulnerability".to_string(),
                    description: "This is a test".to_string(),
                    recommendation: Some("Fix this".to_string()),
                    created_at: None,
                });
            }
        }
    }

    fn schedule(&mut self, now: Instant, running_after: Duration, completed_after: Duration) {
        self.pending = vec![
            Transition { at: now + running_after, status: ScanStatus::Running },
            Transition { at: now + completed_after, status: ScanStatus::Completed },
        ];
    }
}

struct MockState {
    scans: Vec<MockScan>,
    next_id: i64,
}

pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Duration,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    pub fn new(scans: Vec<Scan>) -> Self {
        let next_id = scans.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(MockState {
                scans: scans
                    .into_iter()
                    .map(|scan| MockScan { scan, pending: Vec::new() })
                    .collect(),
                next_id,
            }),
            latency: Duration::ZERO,
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seeded_scans())
    }

    /// 模拟网络延迟
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// 手动安排某个扫描的状态变更（测试用）
    pub fn schedule_status(&self, id: i64, after: Duration, status: ScanStatus) {
        let now = Instant::now();
        let mut state = self.state();
        if let Some(entry) = state.scans.iter_mut().find(|s| s.scan.id == id) {
            entry.pending.push(Transition { at: now + after, status });
            entry.pending.sort_by_key(|t| t.at);
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// 同时进行中的 get 请求的历史最大值
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub async fn list(&self) -> Result<Vec<Scan>, ApiError> {
        self.simulate_latency().await;
        let now = Instant::now();
        let mut state = self.state();
        Ok(state
            .scans
            .iter_mut()
            .map(|entry| {
                entry.advance(now);
                entry.scan.clone()
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<Scan, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.simulate_latency().await;
        let result = {
            let now = Instant::now();
            let mut state = self.state();
            state
                .scans
                .iter_mut()
                .find(|entry| entry.scan.id == id)
                .map(|entry| {
                    entry.advance(now);
                    entry.scan.clone()
                })
                .ok_or(ApiError::NotFound)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// 新扫描 3 秒后进入 running，8 秒后完成
    pub async fn create(&self, target_url: &str, scan_type: ScanType) -> Result<Scan, ApiError> {
        let target_url = validate_target_url(target_url)?;
        self.simulate_latency().await;

        let now = Instant::now();
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;

        let mut entry = MockScan {
            scan: Scan {
                id,
                user_id: None,
                target_url,
                scan_type,
                status: ScanStatus::Pending,
                created_at: Utc::now(),
                completed_at: None,
                vulnerabilities: vec![],
                vulnerability_count: None,
            },
            pending: Vec::new(),
        };
        entry.schedule(now, Duration::from_secs(3), Duration::from_secs(8));
        let scan = entry.scan.clone();
        state.scans.insert(0, entry);
        Ok(scan)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.simulate_latency().await;
        let mut state = self.state();
        let before = state.scans.len();
        state.scans.retain(|entry| entry.scan.id != id);
        if state.scans.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// 重启：回到 pending，2 秒后 running，6 秒后完成
    pub async fn restart(&self, id: i64) -> Result<Scan, ApiError> {
        self.simulate_latency().await;
        let now = Instant::now();
        let mut state = self.state();
        let entry = state
            .scans
            .iter_mut()
            .find(|entry| entry.scan.id == id)
            .ok_or(ApiError::NotFound)?;

        entry.scan.status = ScanStatus::Pending;
        entry.scan.vulnerabilities.clear();
        entry.scan.completed_at = None;
        entry.schedule(now, Duration::from_secs(2), Duration::from_secs(6));
        Ok(entry.scan.clone())
    }
}

impl ScanSource for MockBackend {
    fn fetch_scan(&self, id: i64) -> impl Future<Output = Result<Scan, ApiError>> + Send {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn new_scan_progresses_through_lifecycle() {
        let backend = MockBackend::seeded();
        let scan = backend.create("https://rust-lang.org", ScanType::Ssl).await.unwrap();
        assert_eq!(scan.id, 5);
        assert_eq!(scan.status, ScanStatus::Pending);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(backend.get(5).await.unwrap().status, ScanStatus::Running);

        tokio::time::advance(Duration::from_secs(5)).await;
        let done = backend.get(5).await.unwrap();
        assert_eq!(done.status, ScanStatus::Completed);
        assert!(done.completed_at.is_some());
        assert_eq!(done.vulnerabilities.len(), 1);

        assert_eq!(backend.list().await.unwrap().first().map(|s| s.id), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_and_reruns() {
        let backend = MockBackend::seeded();
        let restarted = backend.restart(1).await.unwrap();
        assert_eq!(restarted.status, ScanStatus::Pending);
        assert!(restarted.vulnerabilities.is_empty());
        assert!(restarted.completed_at.is_none());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(backend.get(1).await.unwrap().status, ScanStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let backend = MockBackend::seeded();
        assert!(matches!(backend.get(99).await, Err(ApiError::NotFound)));
        assert!(matches!(backend.delete(99).await, Err(ApiError::NotFound)));
        backend.delete(4).await.unwrap();
        assert_eq!(backend.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn create_rejects_invalid_url_without_side_effects() {
        let backend = MockBackend::seeded();
        let err = backend.create("not a url", ScanType::Full).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(backend.list().await.unwrap().len(), 4);
    }
}
