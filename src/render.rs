//! 终端输出：把命令结果渲染成文本，颜色随主题变化。

use crate::commands::Dashboard;
use crate::models::{Appearance, Scan, ScanReport, ScanStatus, Settings, Severity, UserStatistics};
use crate::router::Route;
use rust_i18n::t;
use yansi::{Color, Paint};

/// 当前主题下的配色
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
}

impl Palette {
    pub fn for_appearance(appearance: Appearance) -> Self {
        match appearance {
            Appearance::Light => Self {
                accent: Color::Blue,
                success: Color::Green,
                warning: Color::Yellow,
                danger: Color::Red,
                muted: Color::Black,
            },
            Appearance::Dark => Self {
                accent: Color::BrightBlue,
                success: Color::BrightGreen,
                warning: Color::BrightYellow,
                danger: Color::BrightRed,
                muted: Color::BrightBlack,
            },
        }
    }

    fn status(&self, status: ScanStatus) -> Color {
        match status {
            ScanStatus::Completed => self.success,
            ScanStatus::Pending => self.warning,
            ScanStatus::Running => self.accent,
            ScanStatus::Failed => self.danger,
        }
    }

    fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Critical | Severity::High => self.danger,
            Severity::Medium => self.warning,
            Severity::Low => self.accent,
            Severity::Info => self.muted,
        }
    }
}

pub fn status_label(status: ScanStatus, locale: &str) -> String {
    match status {
        ScanStatus::Pending => t!("scan.status.pending", locale = locale),
        ScanStatus::Running => t!("scan.status.running", locale = locale),
        ScanStatus::Completed => t!("scan.status.completed", locale = locale),
        ScanStatus::Failed => t!("scan.status.failed", locale = locale),
    }
    .to_string()
}

/// 成功提示
pub fn success(message: &str) {
    eprintln!("{} {}", "✔".green().bold(), message);
}

/// 错误提示
pub fn error(message: &str) {
    eprintln!("{} {}", "✖".red().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", "•".blue(), message);
}

pub fn dashboard(dashboard: &Dashboard, locale: &str, palette: Palette) {
    let stats = dashboard.stats;
    println!("{}", t!("dashboard.title", locale = locale).fg(palette.accent).bold());
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        t!("dashboard.stats.total", locale = locale),
        stats.total.bold(),
        t!("dashboard.stats.completed", locale = locale),
        stats.completed.fg(palette.success),
        t!("dashboard.stats.pending", locale = locale),
        stats.pending.fg(palette.warning),
        t!("dashboard.stats.failed", locale = locale),
        stats.failed.fg(palette.danger),
    );
    println!();

    if dashboard.scans.is_empty() {
        println!("  {}", t!("dashboard.empty", locale = locale).fg(palette.muted));
        return;
    }

    println!(
        "  {:<6} {:<40} {:<8} {:<12} {:>6}  {}",
        "ID",
        t!("dashboard.columns.url", locale = locale),
        t!("dashboard.columns.type", locale = locale),
        t!("dashboard.columns.status", locale = locale),
        t!("dashboard.columns.issues", locale = locale),
        t!("dashboard.columns.created", locale = locale),
    );
    for scan in &dashboard.scans {
        let status = format!("{:<12}", status_label(scan.status, locale));
        println!(
            "  {:<6} {:<40} {:<8} {} {:>6}  {}",
            format!("#{}", scan.id),
            truncate(&scan.target_url, 40),
            scan.scan_type.as_str(),
            status.fg(palette.status(scan.status)),
            scan.issue_count(),
            scan.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
        );
    }
}

pub fn scan_details(scan: &Scan, locale: &str, palette: Palette) {
    println!("{} {}", "⛨".fg(palette.accent), scan.target_url.bold());
    println!(
        "  ID: #{}  •  {}: {}  •  {}: {}",
        scan.id,
        t!("scan.details.created", locale = locale),
        scan.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
        t!("scan.details.type", locale = locale),
        scan.scan_type.as_str(),
    );
    println!(
        "  {}: {}",
        t!("scan.details.status", locale = locale),
        status_label(scan.status, locale).fg(palette.status(scan.status)).bold()
    );
    println!(
        "  {}: {}",
        t!("scan.details.vulnerabilities", locale = locale),
        scan.issue_count()
    );
    if let Some(completed_at) = scan.completed_at {
        println!(
            "  {}: {}",
            t!("scan.details.completed", locale = locale),
            completed_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
    }

    if scan.vulnerabilities.is_empty() {
        return;
    }

    println!();
    println!("{}", t!("scan.details.findings", locale = locale).bold());
    for vuln in &scan.vulnerabilities {
        println!(
            "  [{}] {}",
            vuln.severity.as_str().to_uppercase().fg(palette.severity(vuln.severity)),
            vuln.title
        );
        if !vuln.description.is_empty() {
            println!("      {}", vuln.description);
        }
        if let Some(recommendation) = &vuln.recommendation {
            println!(
                "      {} {}",
                t!("scan.details.recommendation", locale = locale).fg(palette.muted),
                recommendation
            );
        }
    }
}

pub fn activity(lines: &[String], palette: Palette) {
    for line in lines {
        println!("  {}", line.fg(palette.muted));
    }
}

pub fn report(report: &ScanReport, locale: &str, palette: Palette) {
    let summary = &report.summary;
    println!("{}", t!("report.title", locale = locale).fg(palette.accent).bold());
    println!("  {} (#{})", summary.target_url, summary.scan_id);
    println!(
        "  {}: {}/100  •  {}: {}",
        t!("report.score", locale = locale),
        summary.security_score.bold(),
        t!("report.risk", locale = locale),
        summary.risk_level
    );
    let b = &summary.severity_breakdown;
    println!(
        "  critical {}  high {}  medium {}  low {}  info {}",
        b.critical.fg(palette.danger),
        b.high.fg(palette.danger),
        b.medium.fg(palette.warning),
        b.low.fg(palette.accent),
        b.info
    );
    if !report.recommendations.is_empty() {
        println!();
        println!("{}", t!("report.recommendations", locale = locale).bold());
        for (idx, item) in report.recommendations.iter().enumerate() {
            println!("  {}. {}", idx + 1, item);
        }
    }
}

pub fn statistics(stats: &UserStatistics, locale: &str, palette: Palette) {
    println!("{}", t!("stats.title", locale = locale).fg(palette.accent).bold());
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        t!("dashboard.stats.total", locale = locale),
        stats.total_scans,
        t!("dashboard.stats.completed", locale = locale),
        stats.completed_scans,
        t!("dashboard.stats.pending", locale = locale),
        stats.pending_scans,
        t!("dashboard.stats.failed", locale = locale),
        stats.failed_scans
    );
    println!(
        "  {}: {}",
        t!("stats.vulnerabilities", locale = locale),
        stats.total_vulnerabilities
    );
    if let Some(domain) = &stats.most_scanned_domain {
        println!(
            "  {}: {} ({})",
            t!("stats.most_scanned", locale = locale),
            domain,
            stats.most_scanned_count
        );
    }
}

pub fn settings(settings: &Settings, appearance: Appearance, locale: &str) {
    println!("{}", t!("settings.title", locale = locale).bold());
    println!("  {}: {}", t!("settings.theme", locale = locale), settings.theme.as_str());
    println!(
        "  {}: {}",
        t!("settings.appearance", locale = locale),
        match appearance {
            Appearance::Light => "light",
            Appearance::Dark => "dark",
        }
    );
    println!("  {}: {}", t!("settings.language", locale = locale), settings.language.code());
}

pub fn route(route: Route, locale: &str) {
    println!("{}", t!("route.opened", locale = locale, path = route.to_string()));
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_urls_on_char_boundaries() {
        assert_eq!(truncate("https://a.io", 40), "https://a.io");
        let long = "https://ñandú.example.com/a/very/long/path/that/keeps/going";
        let cut = truncate(long, 20);
        assert_eq!(cut.chars().count(), 20);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn status_labels_are_localized() {
        assert_ne!(
            status_label(ScanStatus::Running, "es"),
            status_label(ScanStatus::Running, "en")
        );
    }
}
