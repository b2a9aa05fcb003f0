use crate::error::{ApiError, ValidationError};
use crate::models::{
    CreateScanRequest, ExportFormat, ListScansQuery, Scan, ScanReport, ScanType, UserStatistics,
};
use crate::services::api::{ApiClient, Bearer};
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;

/// 轮询器依赖的最小接口：按 id 获取扫描
pub trait ScanSource: Send + Sync + 'static {
    fn fetch_scan(&self, id: i64) -> impl Future<Output = Result<Scan, ApiError>> + Send;
}

/// 校验目标 URL，只接受 http/https
pub fn validate_target_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// 远程扫描资源
pub struct ScanService {
    api: Arc<ApiClient>,
}

impl ScanService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ListScansQuery) -> Result<Vec<Scan>, ApiError> {
        self.api.get_json_with_query("scans", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Scan, ApiError> {
        self.api.get_json(&format!("scans/{}", id)).await
    }

    /// 创建扫描；URL 不合法时直接返回校验错误，不发送请求
    pub async fn create(&self, target_url: &str, scan_type: ScanType) -> Result<Scan, ApiError> {
        let target_url = validate_target_url(target_url)?;
        let request = CreateScanRequest { target_url, scan_type };
        let scan: Scan = self
            .api
            .post_json("scans", Some(&request), Bearer::Session)
            .await?;
        log::info!("Scan {} created for {}", scan.id, scan.target_url);
        Ok(scan)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("scans/{}", id)).await?;
        log::info!("Scan {} deleted", id);
        Ok(())
    }

    pub async fn restart(&self, id: i64) -> Result<Scan, ApiError> {
        self.api
            .post_json::<(), Scan>(&format!("scans/{}/restart", id), None, Bearer::Session)
            .await
    }

    pub async fn report(&self, id: i64) -> Result<ScanReport, ApiError> {
        self.api.get_json(&format!("scans/{}/report", id)).await
    }

    /// 下载导出文件的原始内容
    pub async fn export(&self, id: i64, format: ExportFormat) -> Result<String, ApiError> {
        self.api
            .get_text(&format!("scans/{}/export/{}", id, format.as_str()))
            .await
    }

    pub async fn user_statistics(&self) -> Result<UserStatistics, ApiError> {
        self.api.get_json("stats/user").await
    }
}

impl ScanSource for ScanService {
    fn fetch_scan(&self, id: i64) -> impl Future<Output = Result<Scan, ApiError>> + Send {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_targets() {
        assert_eq!(
            validate_target_url("  https://example.com/login ").unwrap(),
            "https://example.com/login"
        );
        assert!(validate_target_url("http://10.0.0.5:8080").is_ok());
    }

    #[test]
    fn rejects_non_urls() {
        assert_eq!(validate_target_url(""), Err(ValidationError::EmptyUrl));
        assert_eq!(validate_target_url("   "), Err(ValidationError::EmptyUrl));
        assert_eq!(validate_target_url("not a url"), Err(ValidationError::InvalidUrl));
        assert_eq!(validate_target_url("example.com"), Err(ValidationError::InvalidUrl));
        assert_eq!(validate_target_url("ftp://example.com"), Err(ValidationError::InvalidUrl));
        assert_eq!(validate_target_url("javascript:alert(1)"), Err(ValidationError::InvalidUrl));
    }
}
