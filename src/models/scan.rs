use crate::error::UnknownVariant;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// 扫描类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Basic,
    Headers,
    Ssl,
    Full,
}

impl ScanType {
    pub const ALL: [ScanType; 4] = [ScanType::Basic, ScanType::Headers, ScanType::Ssl, ScanType::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Basic => "basic",
            ScanType::Headers => "headers",
            ScanType::Ssl => "ssl",
            ScanType::Full => "full",
        }
    }
}

impl Default for ScanType {
    fn default() -> Self {
        ScanType::Full
    }
}

impl FromStr for ScanType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("scan type", s))
    }
}

/// 扫描状态，在服务端单调推进：pending → running → completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub const ALL: [ScanStatus; 4] = [
        ScanStatus::Pending,
        ScanStatus::Running,
        ScanStatus::Completed,
        ScanStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    /// completed 与 failed 为终态，之后不再变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl FromStr for ScanStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("scan status", s))
    }
}

/// 漏洞严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub scan_id: Option<i64>,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default, with = "crate::models::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// 一次针对目标 URL 的安全扫描
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub target_url: String,
    pub scan_type: ScanType,
    pub status: ScanStatus,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::models::timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    /// 列表接口只返回数量，不返回漏洞明细
    #[serde(default)]
    pub vulnerability_count: Option<usize>,
}

impl Scan {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn issue_count(&self) -> usize {
        self.vulnerability_count
            .unwrap_or(0)
            .max(self.vulnerabilities.len())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateScanRequest {
    pub target_url: String,
    pub scan_type: ScanType,
}

/// 列表查询参数
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListScansQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<ScanStatus>,
}

/// 仪表盘统计，pending 包含 running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
}

impl ScanStats {
    pub fn from_scans(scans: &[Scan]) -> Self {
        scans.iter().fold(Self::default(), |mut stats, scan| {
            stats.total += 1;
            match scan.status {
                ScanStatus::Completed => stats.completed += 1,
                ScanStatus::Pending | ScanStatus::Running => stats.pending += 1,
                ScanStatus::Failed => stats.failed += 1,
            }
            stats
        })
    }
}

/// 仪表盘的状态筛选与搜索
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    pub status: Option<ScanStatus>,
    pub search: Option<String>,
}

impl ScanFilter {
    pub fn matches(&self, scan: &Scan) -> bool {
        let matches_status = self.status.map_or(true, |s| scan.status == s);
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => scan
                .target_url
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        };
        matches_status && matches_search
    }

    pub fn apply<'a>(&self, scans: &'a [Scan]) -> Vec<&'a Scan> {
        scans.iter().filter(|s| self.matches(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::seeded_scans;

    #[test]
    fn stats_count_running_as_pending() {
        let scans = seeded_scans();
        let stats = ScanStats::from_scans(&scans);
        assert_eq!(
            stats,
            ScanStats { total: 4, completed: 1, pending: 2, failed: 1 }
        );
    }

    #[test]
    fn filter_combines_status_and_case_insensitive_search() {
        let scans = seeded_scans();

        let filter = ScanFilter { status: None, search: Some("GITHUB".to_string()) };
        let found = filter.apply(&scans);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_url, "https://github.com");

        let filter = ScanFilter { status: Some(ScanStatus::Failed), search: Some("github".to_string()) };
        assert!(filter.apply(&scans).is_empty());

        let filter = ScanFilter { status: Some(ScanStatus::Failed), search: Some("  ".to_string()) };
        assert_eq!(filter.apply(&scans).len(), 1);
    }

    #[test]
    fn parses_enums_case_insensitively() {
        assert_eq!("SSL".parse::<ScanType>().unwrap(), ScanType::Ssl);
        assert_eq!(" running ".parse::<ScanStatus>().unwrap(), ScanStatus::Running);
        assert!("deep".parse::<ScanType>().is_err());
        assert!(ScanStatus::Failed.is_terminal());
        assert!(!ScanStatus::Pending.is_terminal());
    }

    #[test]
    fn list_payload_without_vulnerabilities_deserializes() {
        let json = r#"{
            "id": 12,
            "user_id": 3,
            "target_url": "https://example.com",
            "scan_type": "headers",
            "status": "completed",
            "created_at": "2025-01-02T10:00:00Z",
            "completed_at": "2025-01-02T10:00:09Z",
            "vulnerability_count": 5
        }"#;
        let scan: Scan = serde_json::from_str(json).unwrap();
        assert!(scan.vulnerabilities.is_empty());
        assert_eq!(scan.issue_count(), 5);
        assert!(scan.is_terminal());
    }
}
