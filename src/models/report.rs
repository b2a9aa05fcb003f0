use crate::error::UnknownVariant;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 按严重程度统计的漏洞数量
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub high: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub low: u32,
    #[serde(default)]
    pub info: u32,
}

impl SeverityBreakdown {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: i64,
    pub target_url: String,
    pub scan_type: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub total_vulnerabilities: u32,
    pub severity_breakdown: SeverityBreakdown,
    pub security_score: i32,
    pub risk_level: String,
}

/// 扫描报告（摘要、漏洞明细与修复建议）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub report_generated_at: String,
    pub summary: ScanSummary,
    #[serde(default)]
    pub vulnerabilities: Vec<serde_json::Value>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total_scans: u32,
    pub completed_scans: u32,
    pub pending_scans: u32,
    pub failed_scans: u32,
    pub total_vulnerabilities: u32,
    pub severity_breakdown: SeverityBreakdown,
    pub most_scanned_domain: Option<String>,
    #[serde(default)]
    pub most_scanned_count: u32,
}

/// 报告导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// 与服务端下载文件名保持一致
    pub fn default_file_name(&self, scan_id: i64) -> String {
        match self {
            ExportFormat::Json => format!("scan_{}_report.json", scan_id),
            ExportFormat::Csv => format!("scan_{}_vulnerabilities.csv", scan_id),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(UnknownVariant::new("export format", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_payload_deserializes() {
        let json = r#"{
            "report_generated_at": "2025-05-01T12:00:00",
            "summary": {
                "scan_id": 9,
                "target_url": "https://example.com",
                "scan_type": "full",
                "status": "completed",
                "created_at": "2025-05-01T11:59:00",
                "completed_at": null,
                "total_vulnerabilities": 3,
                "severity_breakdown": {"high": 1, "low": 2},
                "security_score": 72,
                "risk_level": "medium"
            },
            "vulnerabilities": [{"title": "x"}],
            "recommendations": ["Enable HSTS"]
        }"#;
        let report: ScanReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.summary.severity_breakdown.total(), 3);
        assert_eq!(report.summary.severity_breakdown.critical, 0);
        assert_eq!(report.recommendations, vec!["Enable HSTS".to_string()]);
    }

    #[test]
    fn export_file_names_match_server() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::Json.default_file_name(4), "scan_4_report.json");
        assert_eq!(ExportFormat::Csv.default_file_name(4), "scan_4_vulnerabilities.csv");
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
