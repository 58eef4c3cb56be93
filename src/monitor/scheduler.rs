//! 定时调度：扫描与状态报告各有独立的到期时间。
//!
//! 时钟通过 `Clock` 注入，测试中无需真实等待。

use std::time::{Duration, Instant};

use tracing::info;

use super::scan::{PassSummary, Scanner};
use super::source::FileSource;
use super::status::StatusReporter;
use crate::base_system::context::Config;
use crate::base_system::shutdown::ShutdownSignal;
use crate::notify::Notify;

/// 主循环轮询间隔
pub const TICK: Duration = Duration::from_secs(1);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Scan,
    Report,
}

/// 到期时间为 `None` 表示间隔超出了单调时钟的表示范围，该任务永不到期。
#[derive(Debug, Clone)]
pub struct Ticker {
    scan_every: Duration,
    report_every: Duration,
    next_scan: Option<Instant>,
    next_report: Option<Instant>,
}

impl Ticker {
    pub fn new(now: Instant, scan_every: Duration, report_every: Duration) -> Self {
        Self {
            scan_every,
            report_every,
            next_scan: now.checked_add(scan_every),
            next_report: now.checked_add(report_every),
        }
    }

    /// 到期的任务，扫描在前。
    pub fn due(&self, now: Instant) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(2);
        if self.next_scan.is_some_and(|at| now >= at) {
            tasks.push(Task::Scan);
        }
        if self.next_report.is_some_and(|at| now >= at) {
            tasks.push(Task::Report);
        }
        tasks
    }

    /// 任务结束后以结束时刻重新计时，不补跑错过的周期。
    pub fn mark_ran(&mut self, task: Task, now: Instant) {
        match task {
            Task::Scan => self.next_scan = now.checked_add(self.scan_every),
            Task::Report => self.next_report = now.checked_add(self.report_every),
        }
    }

    pub fn next_due(&self, task: Task) -> Option<Instant> {
        match task {
            Task::Scan => self.next_scan,
            Task::Report => self.next_report,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Stopped,
}

pub struct Driver<S, N, C = SystemClock> {
    scanner: Scanner<S, N>,
    status: StatusReporter,
    ticker: Ticker,
    clock: C,
    state: DriverState,
}

impl<S: FileSource, N: Notify, C: Clock> Driver<S, N, C> {
    pub fn new(config: &Config, scanner: Scanner<S, N>, clock: C) -> Self {
        let now = clock.now();
        Self {
            status: StatusReporter::started_at(now, scanner.cursor().current()),
            ticker: Ticker::new(now, config.check_interval(), config.report_interval()),
            scanner,
            clock,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn scanner(&self) -> &Scanner<S, N> {
        &self.scanner
    }

    pub fn notifier(&self) -> &N {
        self.scanner.notifier()
    }

    /// 立即执行一轮扫描，不等待第一个周期。
    pub fn start(&mut self) -> PassSummary {
        self.state = DriverState::Running;
        info!("Performing initial check...");
        self.scanner.scan(&mut self.status)
    }

    /// 执行所有到期任务并返回执行了哪些。
    pub fn tick(&mut self) -> Vec<Task> {
        let due = self.ticker.due(self.clock.now());
        for &task in &due {
            match task {
                Task::Scan => {
                    self.scanner.scan(&mut self.status);
                }
                Task::Report => self.send_status_report(),
            }
            self.ticker.mark_ran(task, self.clock.now());
        }
        due
    }

    pub fn send_status_report(&self) {
        let report = self.status.render_at(self.clock.now());
        info!(
            checks = self.status.checks_performed(),
            found = self.status.files_found(),
            downloaded = self.status.files_downloaded(),
            "sending status report"
        );
        self.scanner.notifier().send(&report);
    }

    /// 运行到收到中断为止。
    pub fn run(&mut self, shutdown: &ShutdownSignal) {
        self.start();
        info!("Entering monitoring loop...");
        while !shutdown.wait(TICK) {
            self.tick();
        }
        self.state = DriverState::Stopped;
        info!("Termination signal received, program ending");
    }
}
