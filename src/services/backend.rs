use crate::error::ApiError;
use crate::models::{ExportFormat, ListScansQuery, Scan, ScanReport, ScanType, UserStatistics};
use crate::services::mock::MockBackend;
use crate::services::scans::{ScanService, ScanSource};
use std::future::Future;

/// 扫描数据来源：远程服务或离线演示数据
pub enum ScanBackend {
    Remote(ScanService),
    Offline(MockBackend),
}

impl ScanBackend {
    pub fn is_offline(&self) -> bool {
        matches!(self, ScanBackend::Offline(_))
    }

    pub async fn list(&self, query: &ListScansQuery) -> Result<Vec<Scan>, ApiError> {
        match self {
            ScanBackend::Remote(service) => service.list(query).await,
            ScanBackend::Offline(mock) => {
                let scans = mock.list().await?;
                Ok(scans
                    .into_iter()
                    .filter(|s| query.status_filter.map_or(true, |st| s.status == st))
                    .skip(query.skip.unwrap_or(0) as usize)
                    .take(query.limit.map_or(usize::MAX, |l| l as usize))
                    .collect())
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Scan, ApiError> {
        match self {
            ScanBackend::Remote(service) => service.get(id).await,
            ScanBackend::Offline(mock) => mock.get(id).await,
        }
    }

    pub async fn create(&self, target_url: &str, scan_type: ScanType) -> Result<Scan, ApiError> {
        match self {
            ScanBackend::Remote(service) => service.create(target_url, scan_type).await,
            ScanBackend::Offline(mock) => mock.create(target_url, scan_type).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        match self {
            ScanBackend::Remote(service) => service.delete(id).await,
            ScanBackend::Offline(mock) => mock.delete(id).await,
        }
    }

    pub async fn restart(&self, id: i64) -> Result<Scan, ApiError> {
        match self {
            ScanBackend::Remote(service) => service.restart(id).await,
            ScanBackend::Offline(mock) => mock.restart(id).await,
        }
    }

    /// 报告与统计只由远程服务提供
    fn remote(&self) -> Result<&ScanService, ApiError> {
        match self {
            ScanBackend::Remote(service) => Ok(service),
            ScanBackend::Offline(_) => Err(ApiError::Backend {
                status: 501,
                detail: Some("Reports are not available in offline mode".to_string()),
            }),
        }
    }

    pub async fn report(&self, id: i64) -> Result<ScanReport, ApiError> {
        self.remote()?.report(id).await
    }

    pub async fn export(&self, id: i64, format: ExportFormat) -> Result<String, ApiError> {
        self.remote()?.export(id, format).await
    }

    pub async fn user_statistics(&self) -> Result<UserStatistics, ApiError> {
        self.remote()?.user_statistics().await
    }
}

impl ScanSource for ScanBackend {
    fn fetch_scan(&self, id: i64) -> impl Future<Output = Result<Scan, ApiError>> + Send {
        self.get(id)
    }
}
