//! 文件监控流程模块入口。
//!
//! 子模块：
//! - `candidate`   — 候选文件（编号 × 扩展名）与扫描游标
//! - `source`      — 远端文件服务抽象
//! - `checker`     — HEAD 存在性探测
//! - `downloader`  — 下载、重名处理、速度统计
//! - `status`      — 计数与状态报告
//! - `scan`        — 扫描循环与去重集合
//! - `scheduler`   — 定时调度与主循环

#![allow(dead_code)]

pub mod candidate;
pub mod checker;
pub mod downloader;
pub mod scan;
pub mod scheduler;
pub mod source;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use scan::Scanner;
pub use scheduler::{Driver, SystemClock};
