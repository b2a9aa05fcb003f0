use crate::models::{Scan, ScanStatus};
use chrono::{DateTime, Local};
use rust_i18n::t;
use std::collections::VecDeque;
use std::time::Duration;

/// 扫描详情页“实时活动”区域保留的最大行数
pub const MAX_LINES: usize = 20;
pub const TICK: Duration = Duration::from_secs(2);

/// 模拟的扫描实时日志
pub struct ActivityFeed {
    locale: &'static str,
    lines: VecDeque<String>,
    cursor: usize,
}

impl ActivityFeed {
    pub fn new(locale: &'static str) -> Self {
        Self {
            locale,
            lines: VecDeque::with_capacity(MAX_LINES),
            cursor: 0,
        }
    }

    fn running_message(&self, index: usize) -> String {
        let locale = self.locale;
        match index % 5 {
            0 => t!("activity.running.ssl", locale = locale),
            1 => t!("activity.running.headers", locale = locale),
            2 => t!("activity.running.https", locale = locale),
            3 => t!("activity.running.known_vulns", locale = locale),
            _ => t!("activity.running.csp_cors", locale = locale),
        }
        .to_string()
    }

    /// running 状态下每个 tick 追加一行
    pub fn tick(&mut self, now: DateTime<Local>) -> &str {
        let line = format!("[{}] {}", now.format("%H:%M:%S"), self.running_message(self.cursor));
        self.cursor += 1;
        if self.lines.len() == MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.lines.back().map(String::as_str).unwrap_or_default()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// 当前状态对应的日志内容；running 时返回滚动日志
    pub fn render(&self, scan: &Scan) -> Vec<String> {
        let locale = self.locale;
        match scan.status {
            ScanStatus::Pending => vec![t!("activity.pending", locale = locale).to_string()],
            ScanStatus::Running => self.lines.iter().cloned().collect(),
            ScanStatus::Completed => vec![
                t!("activity.completed.started", locale = locale).to_string(),
                t!("activity.completed.ssl_check", locale = locale).to_string(),
                t!("activity.completed.ssl_valid", locale = locale).to_string(),
                t!("activity.completed.headers_check", locale = locale).to_string(),
                t!("activity.completed.csp_missing", locale = locale).to_string(),
                t!("activity.completed.ports", locale = locale).to_string(),
                t!("activity.completed.no_critical", locale = locale).to_string(),
                t!("activity.completed.finished", locale = locale).to_string(),
                t!("activity.completed.result", locale = locale, count = scan.issue_count()).to_string(),
            ],
            ScanStatus::Failed => vec![t!("activity.failed", locale = locale).to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::seeded_scans;

    #[test]
    fn keeps_only_the_last_twenty_lines() {
        let mut feed = ActivityFeed::new("en");
        let now = Local::now();
        for _ in 0..25 {
            feed.tick(now);
        }
        assert_eq!(feed.lines().count(), MAX_LINES);

        let first = feed.lines().next().unwrap().to_string();
        let sixth = feed.lines().nth(5).unwrap().to_string();
        assert_eq!(first.split_once("] ").unwrap().1, sixth.split_once("] ").unwrap().1);
    }

    #[test]
    fn transcript_depends_on_status() {
        let scans = seeded_scans();
        let feed = ActivityFeed::new("en");

        let completed = feed.render(&scans[0]);
        assert_eq!(completed.len(), 9);
        assert!(completed.last().unwrap().contains('2'));

        assert!(feed.render(&scans[1]).is_empty());
        assert_eq!(feed.render(&scans[2]).len(), 1);
        assert_eq!(feed.render(&scans[3]).len(), 1);
    }
}
