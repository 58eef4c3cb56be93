//! 运行状态计数与定期报告。

use std::time::Instant;

use time::OffsetDateTime;

use crate::base_system::local_time;

#[derive(Debug, Clone)]
pub struct StatusReporter {
    started: Instant,
    files_found: u64,
    files_downloaded: u64,
    checks_performed: u64,
    last_check: Option<OffsetDateTime>,
    current_index: u64,
}

impl StatusReporter {
    pub fn new(current_index: u64) -> Self {
        Self::started_at(Instant::now(), current_index)
    }

    pub fn started_at(started: Instant, current_index: u64) -> Self {
        Self {
            started,
            files_found: 0,
            files_downloaded: 0,
            checks_performed: 0,
            last_check: None,
            current_index,
        }
    }

    /// 每次扫描结束调用一次，即使两个计数都为 0。
    pub fn record(&mut self, found: u64, downloaded: u64) {
        self.record_at(found, downloaded, local_time::now());
    }

    pub fn record_at(&mut self, found: u64, downloaded: u64, at: OffsetDateTime) {
        self.files_found += found;
        self.files_downloaded += downloaded;
        self.last_check = Some(at);
        self.checks_performed += 1;
    }

    pub fn set_current_index(&mut self, index: u64) {
        self.current_index = index;
    }

    pub fn files_found(&self) -> u64 {
        self.files_found
    }

    pub fn files_downloaded(&self) -> u64 {
        self.files_downloaded
    }

    pub fn checks_performed(&self) -> u64 {
        self.checks_performed
    }

    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    pub fn last_check(&self) -> Option<OffsetDateTime> {
        self.last_check
    }

    pub fn render(&self) -> String {
        self.render_at(Instant::now())
    }

    pub fn render_at(&self, now: Instant) -> String {
        let runtime = now.saturating_duration_since(self.started).as_secs();
        let days = runtime / 86_400;
        let hours = (runtime % 86_400) / 3_600;
        let minutes = (runtime % 3_600) / 60;
        let last_check = self
            .last_check
            .map(local_time::format_timestamp)
            .unwrap_or_else(|| "Not Started".to_string());

        format!(
            "📊 File Monitor Status Report\n\
             🕒 Runtime: {days}d {hours}h {minutes}m\n\
             🔄 Checks Performed: {}\n\
             📁 Files Found: {}\n\
             💾 Downloads Successful: {}\n\
             🔍 Current Index: {}\n\
             ⏱ Last Check: {last_check}",
            self.checks_performed, self.files_found, self.files_downloaded, self.current_index,
        )
    }
}
